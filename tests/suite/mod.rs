mod address_flow;
mod config;
mod submission;
