//! Stage state machine: consumes a script line by line and assembles the
//! [`Document`], enforcing the round grammar.
//!
//! Line categories, checked in this order:
//! - `#...` and blank lines are ignored
//! - `!...` is a directive (`!wall_life_token <clue>` or a round name)
//! - `-...` is a heading that opens a puzzle, wall group, or vowel category
//! - anything else is a clue line for the open element
//!
//! In the connections and sequences rounds a media clue takes two lines:
//! the reference, then a plain text caption. In the vowels round a line
//! starting with `=` is a clue whose solution is the next line.

use crate::builder::DocumentBuilder;
use crate::classify::{classify, text_clue, ClueForm};
use crate::error::CompileError;
use crate::model::{Clue, Document, Round, VowelEntry, CLUES_PER_PUZZLE};
use crate::resolve::{resolve, MediaResolver, PartialMediaClue, Resolved};

/// Directive that sets the reusable walls-round life token.
pub const LIFE_TOKEN_DIRECTIVE: &str = "wall_life_token";

/// Second half of a two-line clue still to come.
#[derive(Debug)]
enum Pending {
    Caption(PartialMediaClue),
    VowelSolution(String),
}

pub struct StageMachine<'a> {
    file: String,
    resolver: &'a dyn MediaResolver,
    builder: DocumentBuilder,
    round: Round,
    /// Headings opened in the current round.
    elements: usize,
    /// Items in the open element. Set to the full count on round entry so
    /// the first heading has nothing to close.
    items: usize,
    pending: Option<Pending>,
    last_line: u32,
}

impl<'a> StageMachine<'a> {
    pub fn new(file: &str, resolver: &'a dyn MediaResolver) -> Self {
        StageMachine {
            file: file.to_owned(),
            resolver,
            builder: DocumentBuilder::new(),
            round: Round::Start,
            elements: 0,
            items: CLUES_PER_PUZZLE,
            pending: None,
            last_line: 0,
        }
    }

    pub fn round(&self) -> Round {
        self.round
    }

    /// True while the previous line left a two-line clue half built.
    pub fn is_assembly_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Consume one input line. `line_no` is 1-based.
    pub fn feed(&mut self, line_no: u32, line: &str) -> Result<(), CompileError> {
        self.last_line = line_no;
        if line.starts_with('#') || line.trim().is_empty() {
            return Ok(());
        }
        if let Some(cmd) = line.strip_prefix('!') {
            return self.directive(line_no, cmd.trim());
        }
        if self.round == Round::Start {
            return Err(self.before_first_round(line_no));
        }
        if let Some(title) = line.strip_prefix('-') {
            return self.heading(line_no, title.trim());
        }
        if self.elements == 0 {
            return Err(CompileError::no_open_puzzle(&self.file, line_no));
        }
        match self.round {
            Round::Connections | Round::Sequences => self.captioned_clue(line_no, line),
            Round::Walls => self.wall_clue(line_no, line),
            Round::Vowels => self.vowel_entry(line_no, line),
            Round::Start => Err(self.before_first_round(line_no)),
        }
    }

    /// End of input: the last element must be closed and every round
    /// opened.
    pub fn finish(self) -> Result<Document, CompileError> {
        let line = self.last_line;
        self.check_element_closed(line)?;
        if self.round != Round::Vowels {
            return Err(CompileError::premature_end_of_file(
                &self.file,
                line,
                self.round.name(),
            ));
        }
        Ok(self.builder.finish())
    }

    // ──────────────────────────────────────────────
    // Directives and headings
    // ──────────────────────────────────────────────

    fn directive(&mut self, line_no: u32, cmd: &str) -> Result<(), CompileError> {
        let (opcode, params) = cmd.split_once(' ').unwrap_or((cmd, ""));
        if opcode == LIFE_TOKEN_DIRECTIVE {
            return self.life_token(line_no, params);
        }

        self.check_element_closed(line_no)?;
        let next = match self.round.next() {
            Some(next) => next,
            None => {
                return Err(CompileError::unexpected_round_order(
                    &self.file,
                    line_no,
                    "nothing should come after vowels stage",
                ))
            }
        };
        if cmd != next.name() {
            let message = match self.round {
                Round::Start => "connections stage should come first".to_owned(),
                current => format!("{} stage should be followed by {}", current, next),
            };
            return Err(CompileError::unexpected_round_order(
                &self.file, line_no, message,
            ));
        }
        if let Some(required) = self.round.required_elements() {
            if self.elements != required {
                return Err(CompileError::wrong_element_count(
                    &self.file,
                    line_no,
                    &format!(
                        "too few {} in {} stage",
                        self.round.element_noun(),
                        self.round
                    ),
                    required,
                    self.elements,
                ));
            }
        }

        tracing::debug!(line = line_no, from = %self.round, to = %next, "entering stage");
        self.round = next;
        self.elements = 0;
        self.items = CLUES_PER_PUZZLE;
        Ok(())
    }

    fn life_token(&mut self, line_no: u32, params: &str) -> Result<(), CompileError> {
        if self.round != Round::Start {
            return Err(CompileError::unexpected_round_order(
                &self.file,
                line_no,
                "customization commands should be placed at the beginning of the file",
            ));
        }
        let form = self.classify(line_no, params)?;
        if form.is_audio() {
            return Err(CompileError::audio_not_supported(
                &self.file,
                line_no,
                "audio can't be used as a life token",
            ));
        }
        if self.builder.has_life_token() {
            return Err(CompileError::duplicate_life_token(&self.file, line_no));
        }
        let token = self.resolve(line_no, form)?.into_standalone();
        self.builder.set_life_token(token);
        Ok(())
    }

    fn heading(&mut self, line_no: u32, title: &str) -> Result<(), CompileError> {
        self.check_element_closed(line_no)?;
        if let Some(limit) = self.round.required_elements() {
            if self.elements >= limit {
                return Err(CompileError::too_many_elements(
                    &self.file,
                    line_no,
                    &format!(
                        "too many {} in {} stage",
                        self.round.element_noun(),
                        self.round
                    ),
                    limit,
                ));
            }
        }
        if !self.builder.open(self.round, title.to_owned()) {
            return Err(self.before_first_round(line_no));
        }
        self.elements += 1;
        self.items = 0;
        Ok(())
    }

    fn check_element_closed(&self, line_no: u32) -> Result<(), CompileError> {
        if self.pending.is_some() {
            return Err(CompileError::incomplete_clue(
                &self.file,
                line_no,
                "incomplete clue, did you forget to provide a solution?",
            ));
        }
        if self.items != CLUES_PER_PUZZLE {
            return Err(CompileError::wrong_element_count(
                &self.file,
                line_no,
                "incorrect number of clues in previous puzzle",
                CLUES_PER_PUZZLE,
                self.items,
            ));
        }
        Ok(())
    }

    fn before_first_round(&self, line_no: u32) -> CompileError {
        CompileError::unexpected_round_order(
            &self.file,
            line_no,
            "file should start with \"!connections\" to denote start of connections section",
        )
    }

    // ──────────────────────────────────────────────
    // Clue lines
    // ──────────────────────────────────────────────

    fn captioned_clue(&mut self, line_no: u32, line: &str) -> Result<(), CompileError> {
        if let Some(Pending::Caption(partial)) = self.pending.take() {
            return match self.classify(line_no, line)? {
                ClueForm::LiteralText(caption) => {
                    self.push(line_no, partial.with_caption(Some(caption)))
                }
                _ => Err(CompileError::incomplete_clue(
                    &self.file,
                    line_no,
                    "incomplete clue, a media clue must be followed by a plain text solution",
                )),
            };
        }

        self.items += 1;
        let form = self.classify(line_no, line)?;
        match self.resolve(line_no, form)? {
            Resolved::Clue(clue) => self.push(line_no, clue),
            Resolved::Partial(partial) => {
                self.pending = Some(Pending::Caption(partial));
                Ok(())
            }
        }
    }

    fn wall_clue(&mut self, line_no: u32, line: &str) -> Result<(), CompileError> {
        self.items += 1;
        let form = self.classify(line_no, line)?;
        if form.is_audio() {
            return Err(CompileError::audio_not_supported_in_walls(
                &self.file, line_no,
            ));
        }
        let clue = self.resolve(line_no, form)?.into_standalone();
        self.push(line_no, clue)
    }

    fn vowel_entry(&mut self, line_no: u32, line: &str) -> Result<(), CompileError> {
        let entry = match self.pending.take() {
            Some(Pending::VowelSolution(clue)) => VowelEntry::ClueSolutionPair {
                clue,
                solution: text_clue(line),
            },
            _ => {
                self.items += 1;
                if let Some(clue) = line.strip_prefix('=') {
                    self.pending = Some(Pending::VowelSolution(text_clue(clue)));
                    return Ok(());
                }
                VowelEntry::SolutionOnly {
                    solution: text_clue(line),
                }
            }
        };
        if !self.builder.push_vowel_entry(entry) {
            return Err(CompileError::no_open_puzzle(&self.file, line_no));
        }
        Ok(())
    }

    /// Hand a finished clue to the open element.
    fn push(&mut self, line_no: u32, clue: Clue) -> Result<(), CompileError> {
        if !self.builder.push_clue(self.round, clue) {
            return Err(CompileError::no_open_puzzle(&self.file, line_no));
        }
        Ok(())
    }

    fn classify(&self, line_no: u32, line: &str) -> Result<ClueForm, CompileError> {
        classify(line)
            .map_err(|e| CompileError::malformed_audio_parameters(&self.file, line_no, e.to_string()))
    }

    fn resolve(&self, line_no: u32, form: ClueForm) -> Result<Resolved, CompileError> {
        resolve(form, self.resolver)
            .map_err(|e| CompileError::media_resolution_failed(&self.file, line_no, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::resolve::OfflineResolver;

    fn feed_all(m: &mut StageMachine, src: &str) -> Result<(), CompileError> {
        for (i, line) in src.lines().enumerate() {
            m.feed(i as u32 + 1, line)?;
        }
        Ok(())
    }

    fn puzzle(title: &str) -> String {
        format!("-{title}\n`{title}1\n`{title}2\n`{title}3\n`{title}4\n")
    }

    #[test]
    fn comments_and_blanks_change_nothing() {
        let mut m = StageMachine::new("t", &OfflineResolver);
        feed_all(&mut m, "# header\n\n   \n").unwrap();
        assert_eq!(m.round(), Round::Start);
    }

    #[test]
    fn clue_before_connections_is_order_error() {
        let mut m = StageMachine::new("t", &OfflineResolver);
        let err = feed_all(&mut m, "# c\n-Heading\n").unwrap_err();
        assert_eq!(err.kind, ErrorKind::StructuralOrder);
        assert_eq!(err.line, 2);
    }

    #[test]
    fn first_directive_must_be_connections() {
        let mut m = StageMachine::new("t", &OfflineResolver);
        let err = feed_all(&mut m, "!sequences\n").unwrap_err();
        assert_eq!(err.kind, ErrorKind::StructuralOrder);
        assert_eq!(err.message, "connections stage should come first");
    }

    #[test]
    fn clue_without_heading_is_no_open_puzzle() {
        let mut m = StageMachine::new("t", &OfflineResolver);
        let err = feed_all(&mut m, "!connections\nstray\n").unwrap_err();
        assert_eq!(err.kind, ErrorKind::NoOpenPuzzle);
        assert_eq!(err.line, 2);
    }

    #[test]
    fn heading_closes_previous_puzzle_with_count_check() {
        let mut m = StageMachine::new("t", &OfflineResolver);
        let err = feed_all(&mut m, "!connections\n-A\na\nb\nc\n-B\n").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Cardinality);
        assert_eq!(err.line, 6);
        assert_eq!(
            err.message,
            "incorrect number of clues in previous puzzle, expected 4, got 3"
        );
    }

    #[test]
    fn media_clue_waits_for_caption() {
        let mut m = StageMachine::new("t", &OfflineResolver);
        feed_all(&mut m, "!connections\n-A\nimages/a.png\n").unwrap();
        assert!(m.is_assembly_pending());
        m.feed(4, "A cat").unwrap();
        assert!(!m.is_assembly_pending());
    }

    #[test]
    fn second_media_line_in_caption_slot_fails() {
        let mut m = StageMachine::new("t", &OfflineResolver);
        let err = feed_all(&mut m, "!connections\n-A\nimages/foo.png\nimages/bar.png\n").unwrap_err();
        assert_eq!(err.kind, ErrorKind::IncompleteAssembly);
        assert_eq!(err.line, 4);
    }

    #[test]
    fn markup_in_caption_slot_fails() {
        let mut m = StageMachine::new("t", &OfflineResolver);
        let err = feed_all(&mut m, "!connections\n-A\nimages/a.png\n__html:<b>x</b>\n").unwrap_err();
        assert_eq!(err.kind, ErrorKind::IncompleteAssembly);
        assert_eq!(err.line, 4);
    }

    #[test]
    fn clue_with_no_element_to_hold_it_is_reported() {
        let mut m = StageMachine::new("t", &OfflineResolver);
        feed_all(&mut m, "!connections\n").unwrap();
        let err = m.push(9, Clue::Text("lost".into())).unwrap_err();
        assert_eq!(err.kind, ErrorKind::NoOpenPuzzle);
        assert_eq!(err.line, 9);
    }

    #[test]
    fn backtick_caption_is_always_literal() {
        let mut m = StageMachine::new("t", &OfflineResolver);
        feed_all(&mut m, "!connections\n-A\nimages/foo.png\n`images/bar.png\n").unwrap();
        assert!(!m.is_assembly_pending());
    }

    #[test]
    fn pending_caption_blocks_heading() {
        let mut m = StageMachine::new("t", &OfflineResolver);
        let src = "!connections\n-A\na\nb\nc\nimages/d.png\n-B\n";
        let err = feed_all(&mut m, src).unwrap_err();
        assert_eq!(err.kind, ErrorKind::IncompleteAssembly);
        assert_eq!(err.line, 7);
    }

    #[test]
    fn seventh_puzzle_is_too_many() {
        let mut m = StageMachine::new("t", &OfflineResolver);
        let mut src = String::from("!connections\n");
        for i in 0..7 {
            src.push_str(&puzzle(&format!("P{i}")));
        }
        let err = feed_all(&mut m, &src).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Cardinality);
        assert_eq!(err.line, 32);
        assert_eq!(err.message, "too many puzzles in connections stage, expected 6");
    }

    #[test]
    fn round_advance_checks_element_count() {
        let mut m = StageMachine::new("t", &OfflineResolver);
        let mut src = String::from("!connections\n");
        for i in 0..5 {
            src.push_str(&puzzle(&format!("P{i}")));
        }
        src.push_str("!sequences\n");
        let err = feed_all(&mut m, &src).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Cardinality);
        assert_eq!(err.line, 27);
        assert_eq!(err.message, "too few puzzles in connections stage, expected 6, got 5");
    }

    #[test]
    fn wrong_next_round_is_order_error() {
        let mut m = StageMachine::new("t", &OfflineResolver);
        let mut src = String::from("!connections\n");
        for i in 0..6 {
            src.push_str(&puzzle(&format!("P{i}")));
        }
        src.push_str("!walls\n");
        let err = feed_all(&mut m, &src).unwrap_err();
        assert_eq!(err.kind, ErrorKind::StructuralOrder);
        assert_eq!(err.message, "connections stage should be followed by sequences");
    }

    #[test]
    fn life_token_only_at_start_and_once() {
        let mut m = StageMachine::new("t", &OfflineResolver);
        feed_all(&mut m, "!wall_life_token images/heart.png\n").unwrap();
        let err = m.feed(2, "!wall_life_token `x").unwrap_err();
        assert_eq!(err.kind, ErrorKind::DuplicateConfiguration);

        let mut m = StageMachine::new("t", &OfflineResolver);
        let err = feed_all(&mut m, "!connections\n!wall_life_token `x\n").unwrap_err();
        assert_eq!(err.kind, ErrorKind::StructuralOrder);
        assert_eq!(err.line, 2);
    }

    #[test]
    fn audio_life_token_is_rejected() {
        let mut m = StageMachine::new("t", &OfflineResolver);
        let err = feed_all(&mut m, "!wall_life_token audio/ding.mp3\n").unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnsupportedMedia);
    }

    #[test]
    fn malformed_audio_names_its_line() {
        let mut m = StageMachine::new("t", &OfflineResolver);
        let err = feed_all(&mut m, "!connections\n-A\n\naudio/x.mp3 zero\n").unwrap_err();
        assert_eq!(err.kind, ErrorKind::ParameterFormat);
        assert_eq!(err.line, 4);
    }

    #[test]
    fn vowel_pair_waits_for_solution() {
        let mut m = StageMachine::new("t", &OfflineResolver);
        m.round = Round::Vowels;
        feed_all(&mut m, "\n-Capitals\n=France\n").unwrap();
        assert!(m.is_assembly_pending());
        m.feed(4, "PRS").unwrap();
        m.feed(5, "LNDN").unwrap();
        assert!(!m.is_assembly_pending());
        m.feed(6, "=Germany").unwrap();
        let err = m.finish().unwrap_err();
        assert_eq!(err.kind, ErrorKind::IncompleteAssembly);
        assert_eq!(err.line, 6);
    }

    #[test]
    fn empty_input_is_premature_end() {
        let m = StageMachine::new("t", &OfflineResolver);
        let err = m.finish().unwrap_err();
        assert_eq!(err.kind, ErrorKind::StructuralOrder);
        assert!(err.message.contains("start stage"));
    }

    #[test]
    fn nothing_after_vowels() {
        let mut m = StageMachine::new("t", &OfflineResolver);
        m.round = Round::Vowels;
        let err = m.feed(1, "!connections").unwrap_err();
        assert_eq!(err.message, "nothing should come after vowels stage");
    }
}
