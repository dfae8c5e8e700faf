mod common;
mod feed;
mod routing;
