mod common;
mod versioning;
