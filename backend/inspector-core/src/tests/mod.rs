mod classifier;
mod correlation;
mod log_store;
mod mime;
mod session;
