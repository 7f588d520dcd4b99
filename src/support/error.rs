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

use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Unsafe folder name")]
    UnsafeName,
    #[error("Folder does not exist")]
    NxFolder,
    #[error("Folder already exists")]
    FolderExists,
    #[error("Message does not exist")]
    NxMessage,
    #[error("Operation not permitted on special folder")]
    BadOperationOnSpecialFolder,
    #[error("Mailbox root exists but is not a directory")]
    RootNotADirectory,
    #[error("UID store unavailable")]
    StoreUnavailable,
    #[error("Stored UID record corrupt")]
    RecordCorrupt,
    #[error(transparent)]
    Io(#[from] io::Error),
}
