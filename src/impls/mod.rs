mod catalog;
mod chat;
