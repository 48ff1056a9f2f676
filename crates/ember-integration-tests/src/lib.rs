//! End-to-end tests for the Ember guest SDK live in `tests/`.
