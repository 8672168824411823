// Shared model fixtures
mod fixtures;

// Knowledge-base builder tests
mod kbase;
