use crate::board::{Board, BoardError};
use std::error::Error;
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

/// Error type for level parsing operations.
#[derive(Debug)]
pub enum LevelError {
    /// IO error when reading from file
    Io(io::Error),
    /// Invalid level content
    InvalidLevel { index: usize, error: BoardError },
}

impl fmt::Display for LevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LevelError::Io(err) => write!(f, "IO error: {}", err),
            LevelError::InvalidLevel { index, error } => {
                write!(f, "Invalid level {}: {}", index + 1, error)
            }
        }
    }
}

impl Error for LevelError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            LevelError::Io(err) => Some(err),
            LevelError::InvalidLevel { error, .. } => Some(error),
        }
    }
}

impl From<io::Error> for LevelError {
    fn from(err: io::Error) -> Self {
        LevelError::Io(err)
    }
}

/// A collection of Sokoban levels in XSB format.
#[derive(Debug)]
pub struct Levels {
    levels: Vec<Board>,
}

impl Levels {
    /// Parse XSB-formatted Sokoban levels from a string.
    ///
    /// The XSB format uses:
    /// - Lines starting with `;` as level separators/comments
    /// - Standard Sokoban characters (#, @, $, ., *, +, space)
    /// - Empty lines between levels (optional)
    pub fn from_text(contents: &str) -> Result<Self, LevelError> {
        let mut levels = Vec::new();
        let mut current_level = String::new();

        for line in contents.lines() {
            // Comments and blank lines both end the level being read
            if line.trim_start().starts_with(';') || line.trim().is_empty() {
                Self::flush(&mut current_level, &mut levels)?;
                continue;
            }

            current_level.push_str(line);
            current_level.push('\n');
        }

        // Don't forget the last level if file doesn't end with empty line
        Self::flush(&mut current_level, &mut levels)?;

        Ok(Levels { levels })
    }

    fn flush(current_level: &mut String, levels: &mut Vec<Board>) -> Result<(), LevelError> {
        if current_level.is_empty() {
            return Ok(());
        }
        let board = Board::from_text(current_level.trim_end()).map_err(|error| {
            LevelError::InvalidLevel {
                index: levels.len(),
                error,
            }
        })?;
        levels.push(board);
        current_level.clear();
        Ok(())
    }

    /// Parse XSB-formatted Sokoban levels from a text file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LevelError> {
        let contents = fs::read_to_string(path)?;
        Self::from_text(&contents)
    }

    /// Get the nth level (0-indexed).
    pub fn get(&self, index: usize) -> Option<&Board> {
        self.levels.get(index)
    }

    /// Get the number of levels.
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}
