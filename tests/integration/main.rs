mod common;
mod e2e_test;
mod refresh_test;
mod server_test;
