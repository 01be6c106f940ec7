mod common;
mod data;
mod edge;
