mod helpers;
mod mocks;
mod notify;
