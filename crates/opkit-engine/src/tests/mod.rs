
mod registry_tests;
