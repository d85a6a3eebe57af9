mod config_test;
mod pipeline_test;
mod support;
mod worker_test;
