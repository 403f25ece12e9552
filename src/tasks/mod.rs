pub mod results_poller;
