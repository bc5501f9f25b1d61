use nom::{
    bytes::complete::take_till,
    character::complete::char,
    combinator::opt,
    multi::separated_list0,
    sequence::{delimited, preceded},
    IResult,
};

use emmorph_protocol::MorphSegment;

/// A surface runs up to the `+` that introduces the next segment, i.e. the
/// last `+` before the next `[`. Surfaces may contain `+` themselves.
fn surface(input: &str) -> IResult<&str, &str> {
    let end = match input.find('[') {
        Some(open) => input[..open].rfind('+').unwrap_or(open),
        None => input.len(),
    };
    Ok((&input[end..], &input[..end]))
}

/// `lexical[category]` optionally followed by `=surface`.
fn segment(input: &str) -> IResult<&str, MorphSegment> {
    let (input, lexical) = take_till(|c| c == '[')(input)?;
    let (input, category) = delimited(char('['), take_till(|c| c == ']'), char(']'))(input)?;
    let (input, surface) = opt(preceded(char('='), surface))(input)?;

    Ok((
        input,
        MorphSegment::new(lexical, category, surface.unwrap_or(lexical)),
    ))
}

/// Parses the detailed form `alom[/N]=alm+a[Poss.3Sg]=á+val[Ins]`.
///
/// Never fails; an unparsable tail is dropped.
pub fn parse(line: &str) -> Vec<MorphSegment> {
    match separated_list0(char('+'), segment)(line) {
        Ok((rest, segments)) => {
            if !rest.is_empty() {
                tracing::debug!("ignoring unparsable tail {:?} of {:?}", rest, line);
            }
            segments
        }
        Err(err) => {
            tracing::debug!("cannot parse detailed analysis {:?}: {}", line, err);
            Vec::new()
        }
    }
}

/// Renders segments in the detailed form; `=surface` is left out when it
/// equals the lexical form.
pub fn render(segments: &[MorphSegment]) -> String {
    let mut out = String::new();
    for (i, segment) in segments.iter().enumerate() {
        if i > 0 {
            out.push('+');
        }
        out.push_str(&segment.lexical);
        out.push('[');
        out.push_str(&segment.category);
        out.push(']');
        if segment.surface != segment.lexical {
            out.push('=');
            out.push_str(&segment.surface);
        }
    }
    out
}
