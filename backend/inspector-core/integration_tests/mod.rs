mod console;
mod ipc_tests;
