pub mod model_error;
