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

/// Determine whether the given folder display name is "safe".
///
/// Folder names become path elements of Maildir++ directory names, where the
/// dot is the hierarchy separator, so a name containing a dot would silently
/// create (or appear to create) extra hierarchy levels. Path separators and
/// control characters are excluded for the usual reasons.
///
/// This does not care about whether the name is ultimately a valid file name;
/// for that, we simply rely on the OS rejecting it.
pub fn is_safe_name(name: &str) -> bool {
    !name.is_empty()
        && name.find('.').is_none()
        && name.find('/').is_none()
        && name.find('\\').is_none()
        && name.find(|c| c < ' ' || c == '\x7F').is_none()
}
