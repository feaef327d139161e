/// Unit tests for the domain model, analytics and tools
mod basic_tests;
