/// End-to-end tests that drive the server through JSON-RPC
mod basic_integration;
