pub mod logging;
pub mod oauth;
pub mod session;
pub mod upstream;

use clap::{
    builder::styling::{AnsiColor, Effects, Styles},
    Arg, ColorChoice, Command,
};

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("guichet")
        .about("Banking session and authentication gateway")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("8080")
                .env("GUICHET_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("external-url")
                .long("external-url")
                .help("Externally reachable base URL of this gateway (scheme decides the Secure cookie attribute)")
                .env("GUICHET_EXTERNAL_URL")
                .required(true),
        );

    let command = oauth::with_args(command);
    let command = session::with_args(command);
    let command = upstream::with_args(command);
    logging::with_args(command)
}
