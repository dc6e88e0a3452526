mod api_steps;
mod cli_steps;
mod common_steps;
