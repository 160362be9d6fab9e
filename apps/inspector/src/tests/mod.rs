mod connection_info;
mod logger;
