//-
// Copyright (c) 2026, the maildirbox authors
//
// This file is part of maildirbox.
//
// Maildirbox is free software: you can  redistribute it and/or modify it under
// the terms of  the GNU General Public  License as published by  the Free
// Software Foundation, either version 3 of  the License, or (at your option)
// any later version.
//
// Maildirbox is distributed in the hope  that it will be useful, but WITHOUT
// ANY WARRANTY; without  even the implied warranty  of MERCHANTABILITY or
// FITNESS FOR  A PARTICULAR PURPOSE.  See the GNU  General Public License for
// more details.
//
// You should have received a copy of the GNU General Public License along with
// maildirbox. If not, see <http://www.gnu.org/licenses/>.

//! Generation of unique maildir delivery tokens.

use std::sync::atomic::{AtomicU32, Ordering};

use chrono::Utc;
use log::warn;

/// Mints the unique tokens used as maildir file base names.
///
/// Tokens have the form `<secs>.P<pid>Q<seq>M<micros>.<hostname>`: seconds
/// since the epoch, the process id, a process-lifetime sequence number, the
/// sub-second microseconds, and the sanitised host name. The combination is
/// unique across hosts, across processes on one host, and across deliveries
/// within one process, even within the same microsecond.
pub struct TokenGenerator {
    hostname: String,
    seq: AtomicU32,
}

impl TokenGenerator {
    pub fn new() -> Self {
        TokenGenerator {
            hostname: sanitized_hostname(),
            seq: AtomicU32::new(1),
        }
    }

    pub fn next(&self) -> String {
        let now = Utc::now();
        format!(
            "{}.P{}Q{}M{}.{}",
            now.timestamp(),
            nix::unistd::getpid().as_raw(),
            self.seq.fetch_add(1, Ordering::Relaxed),
            now.timestamp_subsec_micros(),
            self.hostname
        )
    }
}

impl Default for TokenGenerator {
    fn default() -> Self {
        TokenGenerator::new()
    }
}

/// The host name with the characters maildir reserves replaced by their
/// conventional octal escape text: `/` becomes `\057` and `:` becomes `\072`
/// (four literal characters each).
fn sanitized_hostname() -> String {
    let mut buf = [0u8; 256];
    let raw = match nix::unistd::gethostname(&mut buf) {
        Ok(cstr) => cstr.to_string_lossy().into_owned(),
        Err(e) => {
            warn!("Unable to determine hostname: {}", e);
            "localhost".to_owned()
        },
    };

    let mut hostname = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '/' => hostname.push_str("\\057"),
            ':' => hostname.push_str("\\072"),
            c => hostname.push(c),
        }
    }
    hostname
}
