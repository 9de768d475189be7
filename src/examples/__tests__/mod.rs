mod calculator_test;
mod group_test;
mod indentation_test;
mod json_test;
mod streaming_test;
