use std::collections::HashMap;

use nom::{
    branch::alt,
    bytes::complete::take_while_m_n,
    character::complete::{anychar, char, none_of, one_of, space0},
    combinator::{map_opt, opt, value},
    multi::fold_many0,
    sequence::preceded,
    IResult,
};

/// Character after a backslash.
fn escape(input: &str) -> IResult<&str, char> {
    alt((
        value('\t', char('t')),
        value('\n', char('n')),
        value('\r', char('r')),
        value('\x0c', char('f')),
        preceded(
            char('u'),
            map_opt(
                take_while_m_n(4, 4, |c: char| c.is_ascii_hexdigit()),
                |hex: &str| u32::from_str_radix(hex, 16).ok().and_then(char::from_u32),
            ),
        ),
        anychar,
    ))(input)
}

fn key(input: &str) -> IResult<&str, String> {
    fold_many0(
        alt((preceded(char('\\'), escape), none_of("=: \t\x0c\\"))),
        String::new,
        |mut acc, c| {
            acc.push(c);
            acc
        },
    )(input)
}

/// Whitespace, at most one `=` or `:`, whitespace.
fn separator(input: &str) -> IResult<&str, ()> {
    let (input, _) = space0(input)?;
    let (input, _) = opt(one_of("=:"))(input)?;
    let (input, _) = space0(input)?;
    Ok((input, ()))
}

fn text(input: &str) -> IResult<&str, String> {
    fold_many0(
        alt((preceded(char('\\'), escape), anychar)),
        String::new,
        |mut acc, c| {
            acc.push(c);
            acc
        },
    )(input)
}

fn entry(input: &str) -> IResult<&str, (String, String)> {
    let (input, key) = key(input)?;
    let (input, _) = separator(input)?;
    let (input, value) = text(input)?;
    Ok((input, (key, value)))
}

/// Joins physical lines ending in an odd number of backslashes with the next
/// line (leading whitespace of the continuation is dropped).
fn logical_lines(source: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current: Option<String> = None;

    for raw in source.lines() {
        let line = match current.take() {
            Some(mut joined) => {
                joined.push_str(raw.trim_start());
                joined
            }
            None => {
                let trimmed = raw.trim_start();
                if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
                    continue;
                }
                trimmed.to_string()
            }
        };

        let trailing = line.chars().rev().take_while(|&c| c == '\\').count();
        if trailing % 2 == 1 {
            let mut open = line;
            open.pop();
            current = Some(open);
        } else {
            lines.push(line);
        }
    }

    if let Some(last) = current {
        lines.push(last);
    }
    lines
}

/// Parses a Java-style properties file. Later keys override earlier ones.
pub fn parse_properties(source: &str) -> HashMap<String, String> {
    let mut properties = HashMap::new();

    for line in logical_lines(source) {
        match entry(&line) {
            Ok((_, (key, value))) => {
                properties.insert(key, value);
            }
            Err(err) => tracing::warn!("skipping properties line {:?}: {}", line, err),
        }
    }

    properties
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_separators_and_comments() {
        let props = parse_properties(
            "# comment\n\
             ! another comment\n\
             \n\
             stemmer.item_sep=;\n\
             stemmer.value_sep : =\n\
             analyzer.params -n 1 hu.hfstol\n",
        );

        assert_eq!(props.len(), 3);
        assert_eq!(props["stemmer.item_sep"], ";");
        assert_eq!(props["stemmer.value_sep"], "=");
        assert_eq!(props["analyzer.params"], "-n 1 hu.hfstol");
    }

    #[test]
    fn test_line_continuation() {
        let props = parse_properties("stemmer.STEM=/N;\\\n    /V;\\\n    /Adj\nnext=1\n");

        assert_eq!(props["stemmer.STEM"], "/N;/V;/Adj");
        assert_eq!(props["next"], "1");
    }

    #[test]
    fn test_escapes() {
        let props = parse_properties("key\\=with\\:colon=tab\\there\\u00e1\n");

        assert_eq!(props["key=with:colon"], "tab\there\u{e1}");
    }

    #[test]
    fn test_later_keys_win() {
        let props = parse_properties("a=1\na=2\n");
        assert_eq!(props["a"], "2");
    }
}
