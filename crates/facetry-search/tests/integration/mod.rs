mod indexer;
mod search;
mod variance;
