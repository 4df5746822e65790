/// Channel coloring for mirrored child output.
///
/// Each supervised process gets a numbered output channel with a fixed
/// ANSI color, so interleaved lines on the supervisor's terminal can be
/// told apart at a glance.
const CYAN: &str = "\x1b[0;36m";
const YELLOW: &str = "\x1b[0;33m";
const NC: &str = "\x1b[0m";

/// Output channel a mirrored line belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// Channel 1: the consensus engine's stdout.
    Consensus,
    /// Channel 2: the application node.
    App,
}

impl Channel {
    fn code(self) -> &'static str {
        match self {
            Channel::Consensus => CYAN,
            Channel::App => YELLOW,
        }
    }
}

/// Wrap a line in its channel's color, resetting at the end.
pub fn paint(line: &str, channel: Channel) -> String {
    format!("{}{line}{NC}", channel.code())
}
