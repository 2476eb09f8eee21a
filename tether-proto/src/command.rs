//! Command-line grammar recognised by the listener endpoint.

/// One dispatched command line.
///
/// Matching is prefix-based on the leading verb token. The argument is the
/// remainder of the line after the separating space and may itself contain
/// spaces. A recognised verb with no argument falls through to
/// [`Command::Shell`], as does everything else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Close the channel and stop the listener.
    Terminate,
    /// Change the session working directory.
    Cd(String),
    /// The peer wants a file: this side acts as sender.
    Download(String),
    /// The peer pushes a file: this side acts as receiver.
    Send(String),
    /// Delete a file.
    Remove(String),
    /// Anything else: run through the shell execution bridge.
    Shell(String),
}

impl Command {
    /// Classifies one received line. Trailing whitespace is ignored.
    pub fn parse(line: &str) -> Self {
        let line = line.trim_end();
        if line == "terminate" {
            return Self::Terminate;
        }
        if let Some((verb, rest)) = line.split_once(' ') {
            let arg = rest.trim();
            if !arg.is_empty() {
                match verb {
                    "cd" => return Self::Cd(arg.to_owned()),
                    "download" => return Self::Download(arg.to_owned()),
                    "send" => return Self::Send(arg.to_owned()),
                    "remove" => return Self::Remove(arg.to_owned()),
                    _ => {}
                }
            }
        }
        Self::Shell(line.to_owned())
    }
}
