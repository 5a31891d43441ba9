// Library root
// -----------
// The binary (`main.rs`) only parses flags, sets up logging and picks a
// mode; everything else lives here so it can be tested without a terminal.
//
// Module responsibilities:
// - `config`: the TOML config file (API key, flags, colors) and editing it.
// - `api`: one blocking GET per query against the v2 API.
// - `xml`: walks the response into pods and subpods.
// - `render`: turns a parsed result into colored text.
// - `pictures`: picture index of the last result and the viewers.
// - `command`: the `:p N` style commands understood by the REPL.
// - `ui`: the query session, REPL and single-query mode.
pub mod api;
pub mod command;
pub mod config;
pub mod error;
pub mod pictures;
pub mod render;
pub mod ui;
pub mod xml;
