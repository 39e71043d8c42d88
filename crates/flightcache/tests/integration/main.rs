mod async_get;
mod blocking;
mod config;
mod utils;
