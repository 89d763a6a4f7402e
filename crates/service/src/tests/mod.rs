mod accounts;
mod documents;
mod jobs;
