mod common;
mod routing;
mod schedule;
