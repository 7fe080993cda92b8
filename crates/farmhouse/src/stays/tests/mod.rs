mod common;
mod ledger;
mod lifecycle;
