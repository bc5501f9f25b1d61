use emmorph_protocol::MorphSegment;

/// Where the scanner is inside an analyzer output line such as
/// `a:a l:l :o m:m :[/N] a:a :[Poss.3Sg] :[Nom]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Left of `:`, collecting surface characters
    Surface,
    /// Right of `:`, collecting lexical characters
    Lexical,
    /// Between `[` and `]`
    Tag,
    /// A space was seen inside a tag
    TagSpace,
}

#[derive(Debug, Default)]
struct Pending {
    lexical: String,
    tag: String,
    surface: String,
}

impl Pending {
    fn is_empty(&self) -> bool {
        self.lexical.is_empty() && self.tag.is_empty() && self.surface.is_empty()
    }

    fn take(&mut self) -> MorphSegment {
        let Pending {
            lexical,
            tag,
            surface,
        } = std::mem::take(self);
        MorphSegment {
            lexical,
            category: tag,
            surface,
        }
    }
}

/// Splits one analyzer output line into segments, in input order.
///
/// Never fails: malformed input yields whatever triples the scan produced.
pub fn tokenize(line: &str) -> Vec<MorphSegment> {
    let mut segments = Vec::new();
    let mut pending = Pending::default();
    let mut state = State::Surface;

    for ch in line.chars() {
        match state {
            State::Surface | State::TagSpace => match ch {
                ':' if state == State::Surface => state = State::Lexical,
                ':' => state = State::Tag,
                ' ' => pending.surface.push(ch),
                _ => {
                    // A character after a finished tag starts the next segment
                    if !pending.tag.is_empty() {
                        segments.push(pending.take());
                    }
                    pending.surface.push(ch);
                }
            },
            State::Lexical => match ch {
                '[' => {
                    state = State::Tag;
                    if !pending.tag.is_empty() {
                        segments.push(pending.take());
                    }
                }
                ' ' => state = State::Surface,
                _ => pending.lexical.push(ch),
            },
            State::Tag => match ch {
                ']' => state = State::Lexical,
                ' ' => state = State::TagSpace,
                _ => pending.tag.push(ch),
            },
        }
    }

    if !pending.is_empty() {
        segments.push(pending.take());
    }
    segments
}
