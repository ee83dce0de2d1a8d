// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! Phrase matching for speech and command triggers. All comparisons are
//! case-insensitive, as everywhere in the script language.

/// True when `needle` occurs anywhere in `haystack`, ignoring case.
pub fn is_substring(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Whole-word speech match: true when any word of the trigger's phrase list
/// equals any word of what was said.
pub fn word_match(speech: &str, phrase_list: &str) -> bool {
    phrase_list.split_whitespace().any(|phrase| {
        speech
            .split_whitespace()
            .any(|word| word.eq_ignore_ascii_case(phrase))
    })
}

/// Command-name match. With `abbrev`, a typed prefix of the trigger's
/// command is enough ("nor" fires a "north" trigger).
pub fn command_match(trigger_cmd: &str, typed: &str, abbrev: bool) -> bool {
    if typed.is_empty() {
        return false;
    }
    if abbrev {
        trigger_cmd
            .get(..typed.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(typed))
    } else {
        trigger_cmd.eq_ignore_ascii_case(typed)
    }
}
