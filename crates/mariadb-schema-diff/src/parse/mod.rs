//! Pattern-based `CREATE TABLE` parser.
//!
//! This is not a full SQL grammar. It tokenizes the statement with a
//! quote/paren-aware scanner and pattern-matches the token stream, which
//! covers the DDL that `SHOW CREATE TABLE` actually emits plus the common
//! hand-written variants. Unrecognized clauses are skipped with a warning
//! rather than failing the whole parse.
//!
//! Normalization applied while building the model:
//! - whitespace runs collapse to single spaces,
//! - reserved keywords are lowercased, identifier text and string literals
//!   are not,
//! - `AUTO_INCREMENT=<n>` in the options tail is parsed and discarded.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use tracing::warn;

use crate::core::table::{
    Column, ForeignKey, Index, IndexColumn, IndexKind, ReferentialAction, Table, TableOptions,
};
use crate::error::{DiffError, Result};

/// Collapse runs of whitespace into single spaces and trim.
pub fn collapse_ws(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whitespace-normalized equality, used for all non-table DDL comparison.
pub fn normalized_eq(a: &str, b: &str) -> bool {
    collapse_ws(a) == collapse_ws(b)
}

/// Strip leading `USE ...` and `CREATE DATABASE ...` statements that some dump
/// sources prepend to object DDL. The reader applies this at capture time so
/// snapshots always hold the bare `CREATE ...` text.
pub fn strip_preamble(ddl: &str) -> &str {
    let mut remaining = ddl.trim_start();
    loop {
        let lower = remaining
            .get(..16.min(remaining.len()))
            .unwrap_or("")
            .to_ascii_lowercase();
        if lower.starts_with("use ") || lower.starts_with("create database") {
            match remaining.find(';') {
                Some(pos) => remaining = remaining[pos + 1..].trim_start(),
                None => break,
            }
        } else {
            break;
        }
    }
    remaining.trim_end()
}

/// Parse a `CREATE TABLE` statement into the structured model.
pub fn parse_create_table(ddl: &str) -> Result<Table> {
    let cleaned = strip_comments(ddl);
    if cleaned.trim().is_empty() {
        return Err(DiffError::parse("", "empty DDL"));
    }

    let (name, rest) = parse_header(&cleaned)?;
    let (body, tail) = extract_body(&name, rest)?;
    let options = parse_options(&name, &tail);

    let mut table = Table {
        name: name.clone(),
        columns: Vec::new(),
        indexes: BTreeMap::new(),
        foreign_keys: BTreeMap::new(),
        options,
    };

    for part in split_top_level(&body) {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        parse_body_part(&mut table, part);
    }

    if table.columns.is_empty() {
        return Err(DiffError::parse(&name, "no column definitions found"));
    }

    Ok(table)
}

// ---------------------------------------------------------------------------
// Scanner
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    /// Bare word: keyword, unquoted identifier, or numeric literal.
    Word(String),
    /// Backtick-quoted identifier, unquoted.
    Ident(String),
    /// String literal, verbatim including the surrounding quotes.
    Str(String),
    /// Parenthesized group, verbatim including the parens, whitespace
    /// collapsed outside string literals.
    Group(String),
    /// Punctuation such as `=` or `.`.
    Sym(char),
}

impl Tok {
    fn is_word(&self, kw: &str) -> bool {
        matches!(self, Tok::Word(w) if w.eq_ignore_ascii_case(kw))
    }

    /// Identifier text from either a quoted or a bare token.
    fn ident_text(&self) -> Option<&str> {
        match self {
            Tok::Ident(name) => Some(name),
            Tok::Word(name) => Some(name),
            _ => None,
        }
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '$' | '.')
}

/// Read a string literal starting at `start` (which holds the quote char).
/// Honors doubled-quote and backslash escapes. Returns (literal including
/// quotes, index one past the closing quote).
fn read_string(chars: &[char], start: usize) -> (String, usize) {
    let quote = chars[start];
    let mut out = String::new();
    out.push(quote);
    let mut i = start + 1;
    while i < chars.len() {
        let c = chars[i];
        out.push(c);
        if c == '\\' && i + 1 < chars.len() {
            out.push(chars[i + 1]);
            i += 2;
            continue;
        }
        if c == quote {
            if i + 1 < chars.len() && chars[i + 1] == quote {
                out.push(quote);
                i += 2;
                continue;
            }
            return (out, i + 1);
        }
        i += 1;
    }
    (out, i)
}

/// Read a backticked identifier starting at `start`. `` `` `` inside the
/// quotes denotes a literal backtick. Returns (unquoted name, next index).
fn read_backtick(chars: &[char], start: usize) -> (String, usize) {
    let mut out = String::new();
    let mut i = start + 1;
    while i < chars.len() {
        let c = chars[i];
        if c == '`' {
            if i + 1 < chars.len() && chars[i + 1] == '`' {
                out.push('`');
                i += 2;
                continue;
            }
            return (out, i + 1);
        }
        out.push(c);
        i += 1;
    }
    (out, i)
}

/// Read a parenthesized group starting at `start` (which holds `(`).
/// Respects nested parens and string literals. Returns (group text including
/// parens with collapsed whitespace, next index).
fn read_group(chars: &[char], start: usize) -> (String, usize) {
    let mut out = String::new();
    let mut depth = 0usize;
    let mut i = start;
    let mut pending_space = false;
    while i < chars.len() {
        let c = chars[i];
        match c {
            '\'' | '"' => {
                if pending_space {
                    out.push(' ');
                    pending_space = false;
                }
                let (lit, next) = read_string(chars, i);
                out.push_str(&lit);
                i = next;
                continue;
            }
            '`' => {
                if pending_space {
                    out.push(' ');
                    pending_space = false;
                }
                let (name, next) = read_backtick(chars, i);
                out.push('`');
                out.push_str(&name.replace('`', "``"));
                out.push('`');
                i = next;
                continue;
            }
            '(' => {
                depth += 1;
                if pending_space {
                    out.push(' ');
                    pending_space = false;
                }
                out.push(c);
            }
            ')' => {
                depth -= 1;
                pending_space = false;
                out.push(c);
                if depth == 0 {
                    return (out, i + 1);
                }
            }
            c if c.is_whitespace() => {
                if !out.ends_with('(') {
                    pending_space = true;
                }
            }
            _ => {
                if pending_space {
                    out.push(' ');
                    pending_space = false;
                }
                out.push(c);
            }
        }
        i += 1;
    }
    (out, i)
}

fn tokenize(text: &str) -> Vec<Tok> {
    let chars: Vec<char> = text.chars().collect();
    let mut toks = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
        } else if c == '\'' || c == '"' {
            let (lit, next) = read_string(&chars, i);
            toks.push(Tok::Str(lit));
            i = next;
        } else if c == '`' {
            let (name, next) = read_backtick(&chars, i);
            toks.push(Tok::Ident(name));
            i = next;
        } else if c == '(' {
            let (group, next) = read_group(&chars, i);
            toks.push(Tok::Group(group));
            i = next;
        } else if is_word_char(c) {
            let mut word = String::new();
            while i < chars.len() && is_word_char(chars[i]) {
                word.push(chars[i]);
                i += 1;
            }
            toks.push(Tok::Word(word));
        } else {
            toks.push(Tok::Sym(c));
            i += 1;
        }
    }
    toks
}

// ---------------------------------------------------------------------------
// Statement framing
// ---------------------------------------------------------------------------

/// Remove `-- ` line comments and `/* ... */` block comments outside string
/// literals.
fn strip_comments(ddl: &str) -> String {
    let chars: Vec<char> = ddl.chars().collect();
    let mut out = String::with_capacity(ddl.len());
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            '\'' | '"' => {
                let (lit, next) = read_string(&chars, i);
                out.push_str(&lit);
                i = next;
            }
            '`' => {
                let (name, next) = read_backtick(&chars, i);
                out.push('`');
                out.push_str(&name.replace('`', "``"));
                out.push('`');
                i = next;
            }
            '-' if chars.get(i + 1) == Some(&'-') => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
            }
            '/' if chars.get(i + 1) == Some(&'*') => {
                i += 2;
                while i + 1 < chars.len() && !(chars[i] == '*' && chars[i + 1] == '/') {
                    i += 1;
                }
                i = (i + 2).min(chars.len());
                out.push(' ');
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }
    out
}

/// Consume `CREATE TABLE [IF NOT EXISTS] <name>` and return the table name
/// (last component when schema-qualified) plus the unparsed remainder.
fn parse_header(ddl: &str) -> Result<(String, &str)> {
    let trimmed = ddl.trim_start();
    let mut rest = strip_keyword(trimmed, "CREATE")
        .and_then(|r| strip_keyword(r, "TABLE"))
        .ok_or_else(|| DiffError::parse("", "not a CREATE TABLE statement"))?;

    if let Some(r) = strip_keyword(rest, "IF") {
        rest = strip_keyword(r, "NOT")
            .and_then(|r| strip_keyword(r, "EXISTS"))
            .ok_or_else(|| DiffError::parse("", "malformed IF NOT EXISTS clause"))?;
    }

    let chars: Vec<char> = rest.chars().collect();
    let mut i = 0;
    let mut name = String::new();
    loop {
        while i < chars.len() && chars[i].is_whitespace() {
            i += 1;
        }
        if i >= chars.len() {
            return Err(DiffError::parse("", "missing table name"));
        }
        if chars[i] == '`' {
            let (ident, next) = read_backtick(&chars, i);
            name = ident;
            i = next;
        } else {
            let mut word = String::new();
            while i < chars.len() && is_word_char(chars[i]) && chars[i] != '.' {
                word.push(chars[i]);
                i += 1;
            }
            if word.is_empty() {
                return Err(DiffError::parse("", "missing table name"));
            }
            name = word;
        }
        // Skip the schema component of a qualified name.
        if i < chars.len() && chars[i] == '.' {
            i += 1;
            continue;
        }
        break;
    }

    let consumed: usize = chars[..i].iter().map(|c| c.len_utf8()).sum();
    Ok((name, &rest[consumed..]))
}

fn strip_keyword<'a>(text: &'a str, kw: &str) -> Option<&'a str> {
    let trimmed = text.trim_start();
    if trimmed.len() >= kw.len() && trimmed[..kw.len()].eq_ignore_ascii_case(kw) {
        let rest = &trimmed[kw.len()..];
        if rest.is_empty() || rest.starts_with(|c: char| !is_word_char(c)) {
            return Some(rest);
        }
    }
    None
}

/// Split `( <body> ) <tail>` into the body and the options tail.
fn extract_body<'a>(table: &str, rest: &'a str) -> Result<(String, &'a str)> {
    let chars: Vec<char> = rest.chars().collect();
    let open = chars
        .iter()
        .position(|&c| c == '(')
        .ok_or_else(|| DiffError::parse(table, "missing column list"))?;
    let mut depth = 0usize;
    let mut i = open;
    while i < chars.len() {
        match chars[i] {
            '\'' | '"' => {
                let (_, next) = read_string(&chars, i);
                i = next;
                continue;
            }
            '`' => {
                let (_, next) = read_backtick(&chars, i);
                i = next;
                continue;
            }
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    let body: String = chars[open + 1..i].iter().collect();
                    let consumed: usize = chars[..i + 1].iter().map(|c| c.len_utf8()).sum();
                    return Ok((body, &rest[consumed..]));
                }
            }
            _ => {}
        }
        i += 1;
    }
    Err(DiffError::parse(table, "unbalanced parentheses in column list"))
}

/// Split a body or column-group on top-level commas, respecting parens,
/// string literals, and backticked identifiers.
fn split_top_level(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            '\'' | '"' => {
                let (lit, next) = read_string(&chars, i);
                current.push_str(&lit);
                i = next;
                continue;
            }
            '`' => {
                let (name, next) = read_backtick(&chars, i);
                current.push('`');
                current.push_str(&name.replace('`', "``"));
                current.push('`');
                i = next;
                continue;
            }
            '(' => {
                depth += 1;
                current.push(c);
            }
            ')' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            ',' if depth == 0 => {
                parts.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
        i += 1;
    }
    if !current.trim().is_empty() {
        parts.push(current);
    }
    parts
}

// ---------------------------------------------------------------------------
// Body parts
// ---------------------------------------------------------------------------

fn parse_body_part(table: &mut Table, part: &str) {
    let toks = tokenize(part);
    if toks.is_empty() {
        return;
    }

    if toks[0].is_word("primary") {
        if let Some(index) = parse_primary_key(&toks) {
            table.indexes.insert(index.name.clone(), index);
        } else {
            warn!(table = %table.name, part, "skipping unrecognized PRIMARY KEY clause");
        }
        return;
    }
    if toks[0].is_word("unique") || toks[0].is_word("fulltext") || toks[0].is_word("key") || toks[0].is_word("index") {
        if let Some(index) = parse_index(&toks) {
            table.indexes.insert(index.name.clone(), index);
        } else {
            warn!(table = %table.name, part, "skipping unrecognized index clause");
        }
        return;
    }
    if toks[0].is_word("constraint") || toks[0].is_word("foreign") {
        if let Some(fk) = parse_foreign_key(&toks) {
            table.foreign_keys.insert(fk.name.clone(), fk);
            return;
        }
        // CONSTRAINT ... CHECK (...) parses without error but is not tracked.
        if toks.iter().any(|t| t.is_word("check")) {
            return;
        }
        warn!(table = %table.name, part, "skipping unrecognized constraint clause");
        return;
    }
    if toks[0].is_word("check") {
        return;
    }
    if toks[0].is_word("spatial") {
        warn!(table = %table.name, part, "spatial indexes are not tracked, skipping");
        return;
    }

    match parse_column(&toks, &table.options) {
        Some(parsed) => {
            if parsed.inline_primary {
                table.indexes.insert(
                    "PRIMARY".to_string(),
                    Index {
                        name: "PRIMARY".to_string(),
                        kind: IndexKind::Primary,
                        columns: vec![IndexColumn::new(parsed.column.name.clone())],
                        options: String::new(),
                    },
                );
            }
            if parsed.inline_unique {
                table.indexes.insert(
                    parsed.column.name.clone(),
                    Index {
                        name: parsed.column.name.clone(),
                        kind: IndexKind::Unique,
                        columns: vec![IndexColumn::new(parsed.column.name.clone())],
                        options: String::new(),
                    },
                );
            }
            table.columns.push(parsed.column);
        }
        None => warn!(table = %table.name, part, "skipping unrecognized column definition"),
    }
}

struct ParsedColumn {
    column: Column,
    inline_primary: bool,
    inline_unique: bool,
}

fn parse_column(toks: &[Tok], table_options: &TableOptions) -> Option<ParsedColumn> {
    let name = toks.first()?.ident_text()?.to_string();
    let mut i = 1;

    // Type: base word, optional argument group, optional numeric attributes.
    let base = match toks.get(i) {
        Some(Tok::Word(w)) => w.to_ascii_lowercase(),
        _ => return None,
    };
    i += 1;
    let mut sql_type = base;
    if let Some(Tok::Group(group)) = toks.get(i) {
        sql_type.push_str(group);
        i += 1;
    }
    while let Some(tok) = toks.get(i) {
        if tok.is_word("unsigned") || tok.is_word("zerofill") || tok.is_word("signed") {
            sql_type.push(' ');
            sql_type.push_str(&word_text(tok)?.to_ascii_lowercase());
            i += 1;
        } else {
            break;
        }
    }

    let mut column = Column {
        name,
        sql_type,
        nullable: true,
        default: None,
        extra: String::new(),
        comment: None,
    };
    let mut inline_primary = false;
    let mut inline_unique = false;
    let mut charset: Option<String> = None;
    let mut collation: Option<String> = None;
    let mut generated: Option<String> = None;
    let mut auto_increment = false;
    let mut on_update: Option<String> = None;
    let mut check: Option<String> = None;

    while i < toks.len() {
        let tok = &toks[i];
        if tok.is_word("not") && matches!(toks.get(i + 1), Some(t) if t.is_word("null")) {
            column.nullable = false;
            i += 2;
        } else if tok.is_word("null") {
            column.nullable = true;
            i += 1;
        } else if tok.is_word("default") {
            let (value, next) = read_value(toks, i + 1)?;
            column.default = Some(value);
            i = next;
        } else if tok.is_word("auto_increment") {
            auto_increment = true;
            i += 1;
        } else if tok.is_word("on") && matches!(toks.get(i + 1), Some(t) if t.is_word("update")) {
            let (value, next) = read_value(toks, i + 2)?;
            on_update = Some(value);
            i = next;
        } else if tok.is_word("character")
            && matches!(toks.get(i + 1), Some(t) if t.is_word("set"))
        {
            charset = toks.get(i + 2).and_then(word_text).map(str::to_string);
            i += 3;
        } else if tok.is_word("charset") {
            charset = toks.get(i + 1).and_then(word_text).map(str::to_string);
            i += 2;
        } else if tok.is_word("collate") {
            collation = toks.get(i + 1).and_then(word_text).map(str::to_string);
            i += 2;
        } else if tok.is_word("comment") {
            if let Some(Tok::Str(lit)) = toks.get(i + 1) {
                column.comment = Some(unquote_str(lit));
            }
            i += 2;
        } else if tok.is_word("generated")
            && matches!(toks.get(i + 1), Some(t) if t.is_word("always"))
            && matches!(toks.get(i + 2), Some(t) if t.is_word("as"))
        {
            let (value, next) = parse_generated(toks, i + 3)?;
            generated = Some(value);
            i = next;
        } else if tok.is_word("as") {
            let (value, next) = parse_generated(toks, i + 1)?;
            generated = Some(value);
            i = next;
        } else if tok.is_word("check") {
            if let Some(Tok::Group(group)) = toks.get(i + 1) {
                check = Some(format!("check {}", group));
                i += 2;
            } else {
                i += 1;
            }
        } else if tok.is_word("primary") && matches!(toks.get(i + 1), Some(t) if t.is_word("key")) {
            inline_primary = true;
            i += 2;
        } else if tok.is_word("unique") {
            inline_unique = true;
            i += 1;
            if matches!(toks.get(i), Some(t) if t.is_word("key")) {
                i += 1;
            }
        } else if tok.is_word("references") {
            // Inline REFERENCES clauses are ignored by the server too.
            break;
        } else {
            i += 1;
        }
    }

    // Charset/collation restating the table default is SHOW CREATE noise,
    // not schema drift. Anything else stays part of the type text so the
    // rendered MODIFY clause puts it in the position the dialect expects.
    if let Some(cs) = charset {
        if table_options.default_charset.as_deref() != Some(cs.as_str()) {
            column.sql_type.push_str(&format!(" character set {}", cs));
            if let Some(col) = collation.take() {
                column.sql_type.push_str(&format!(" collate {}", col));
            }
        } else if let Some(col) = collation.take() {
            if table_options.collate.as_deref() != Some(col.as_str()) {
                column.sql_type.push_str(&format!(" collate {}", col));
            }
        }
    } else if let Some(col) = collation {
        if table_options.collate.as_deref() != Some(col.as_str()) {
            column.sql_type.push_str(&format!(" collate {}", col));
        }
    }

    let mut extra_parts = Vec::new();
    if let Some(gen) = generated {
        extra_parts.push(gen);
    }
    if auto_increment {
        extra_parts.push("auto_increment".to_string());
    }
    if let Some(value) = on_update {
        extra_parts.push(format!("on update {}", value));
    }
    if let Some(chk) = check {
        extra_parts.push(chk);
    }
    column.extra = extra_parts.join(" ");

    Some(ParsedColumn {
        column,
        inline_primary,
        inline_unique,
    })
}

/// Read a literal/expression value: a string, a parenthesized expression, or
/// a bare word with an optional call-argument group.
fn read_value(toks: &[Tok], start: usize) -> Option<(String, usize)> {
    match toks.get(start)? {
        Tok::Str(lit) => Some((lit.clone(), start + 1)),
        Tok::Group(group) => Some((group.clone(), start + 1)),
        Tok::Word(word) => {
            if let Some(Tok::Group(group)) = toks.get(start + 1) {
                Some((format!("{}{}", word.to_ascii_lowercase(), group), start + 2))
            } else {
                Some((word.to_ascii_lowercase(), start + 1))
            }
        }
        _ => None,
    }
}

/// Parse `(expr) [STORED | VIRTUAL]` after `GENERATED ALWAYS AS` / `AS`.
fn parse_generated(toks: &[Tok], start: usize) -> Option<(String, usize)> {
    let Tok::Group(expr) = toks.get(start)? else {
        return None;
    };
    let mut i = start + 1;
    let storage = match toks.get(i) {
        Some(t) if t.is_word("stored") => {
            i += 1;
            "stored"
        }
        Some(t) if t.is_word("persistent") => {
            i += 1;
            "stored"
        }
        Some(t) if t.is_word("virtual") => {
            i += 1;
            "virtual"
        }
        _ => "virtual",
    };
    Some((format!("generated always as {} {}", expr, storage), i))
}

fn word_text(tok: &Tok) -> Option<&str> {
    match tok {
        Tok::Word(w) => Some(w),
        Tok::Ident(w) => Some(w),
        _ => None,
    }
}

fn unquote_str(lit: &str) -> String {
    let inner = lit
        .strip_prefix(['\'', '"'])
        .and_then(|s| s.strip_suffix(['\'', '"']))
        .unwrap_or(lit);
    inner.replace("''", "'").replace("\\'", "'")
}

// ---------------------------------------------------------------------------
// Indexes and foreign keys
// ---------------------------------------------------------------------------

fn parse_primary_key(toks: &[Tok]) -> Option<Index> {
    // PRIMARY KEY (cols) [USING BTREE ...]
    if !matches!(toks.get(1), Some(t) if t.is_word("key")) {
        return None;
    }
    let group_pos = toks.iter().position(|t| matches!(t, Tok::Group(_)))?;
    let Tok::Group(group) = &toks[group_pos] else {
        return None;
    };
    Some(Index {
        name: "PRIMARY".to_string(),
        kind: IndexKind::Primary,
        columns: parse_index_columns(group)?,
        options: index_options(toks, group_pos + 1),
    })
}

fn parse_index(toks: &[Tok]) -> Option<Index> {
    let mut i = 0;
    let kind = if toks[0].is_word("unique") {
        i += 1;
        IndexKind::Unique
    } else if toks[0].is_word("fulltext") {
        i += 1;
        IndexKind::Fulltext
    } else {
        IndexKind::Key
    };
    if matches!(toks.get(i), Some(t) if t.is_word("key") || t.is_word("index")) {
        i += 1;
    }
    let name = toks.get(i)?.ident_text()?.to_string();
    i += 1;
    let Tok::Group(group) = toks.get(i)? else {
        return None;
    };
    Some(Index {
        name,
        kind,
        columns: parse_index_columns(group)?,
        options: index_options(toks, i + 1),
    })
}

/// Remaining index tokens (`USING BTREE`, `KEY_BLOCK_SIZE=...`) as normalized
/// lowercase text.
fn index_options(toks: &[Tok], start: usize) -> String {
    let mut parts = Vec::new();
    for tok in &toks[start.min(toks.len())..] {
        match tok {
            Tok::Word(w) => parts.push(w.to_ascii_lowercase()),
            Tok::Str(s) => parts.push(s.clone()),
            Tok::Group(g) => parts.push(g.clone()),
            Tok::Ident(id) => parts.push(format!("`{}`", id)),
            Tok::Sym(c) => parts.push(c.to_string()),
        }
    }
    parts.join(" ")
}

/// Parse `(col, col(10), ...)` into index columns.
fn parse_index_columns(group: &str) -> Option<Vec<IndexColumn>> {
    let inner = group.strip_prefix('(')?.strip_suffix(')')?;
    let mut columns = Vec::new();
    for item in split_top_level(inner) {
        let toks = tokenize(&item);
        let name = toks.first()?.ident_text()?.to_string();
        let prefix = match toks.get(1) {
            Some(Tok::Group(g)) => g
                .strip_prefix('(')
                .and_then(|s| s.strip_suffix(')'))
                .and_then(|s| s.trim().parse::<u32>().ok()),
            _ => None,
        };
        columns.push(IndexColumn { name, prefix });
    }
    if columns.is_empty() {
        None
    } else {
        Some(columns)
    }
}

fn parse_foreign_key(toks: &[Tok]) -> Option<ForeignKey> {
    let mut i = 0;
    let mut name = None;
    if toks[0].is_word("constraint") {
        name = toks.get(1)?.ident_text().map(str::to_string);
        i = 2;
    }
    if !matches!(toks.get(i), Some(t) if t.is_word("foreign")) {
        return None;
    }
    if !matches!(toks.get(i + 1), Some(t) if t.is_word("key")) {
        return None;
    }
    i += 2;
    // Optional index name between FOREIGN KEY and the column list.
    if toks.get(i).and_then(|t| t.ident_text()).is_some()
        && !matches!(toks.get(i), Some(Tok::Group(_)))
    {
        if name.is_none() {
            name = toks[i].ident_text().map(str::to_string);
        }
        i += 1;
    }
    let Tok::Group(cols_group) = toks.get(i)? else {
        return None;
    };
    let columns = ident_list(cols_group)?;
    i += 1;
    if !matches!(toks.get(i), Some(t) if t.is_word("references")) {
        return None;
    }
    i += 1;
    let mut ref_table = toks.get(i)?.ident_text()?.to_string();
    i += 1;
    // Qualified reference: take the table component. A bare qualified name
    // tokenizes as a single word containing the dot.
    if matches!(toks.get(i), Some(Tok::Sym('.')))
        || matches!(toks.get(i), Some(Tok::Word(w)) if w == ".")
    {
        ref_table = toks.get(i + 1)?.ident_text()?.to_string();
        i += 2;
    }
    if let Some(pos) = ref_table.rfind('.') {
        ref_table = ref_table[pos + 1..].to_string();
    }
    let Tok::Group(ref_group) = toks.get(i)? else {
        return None;
    };
    let ref_columns = ident_list(ref_group)?;
    i += 1;

    let mut on_delete = ReferentialAction::default();
    let mut on_update = ReferentialAction::default();
    while i < toks.len() {
        if toks[i].is_word("on") {
            let which = toks.get(i + 1)?;
            let (action, next) = read_action(toks, i + 2)?;
            if which.is_word("delete") {
                on_delete = action;
            } else if which.is_word("update") {
                on_update = action;
            }
            i = next;
        } else {
            i += 1;
        }
    }

    Some(ForeignKey {
        name: name?,
        columns,
        ref_table,
        ref_columns,
        on_delete,
        on_update,
    })
}

fn read_action(toks: &[Tok], start: usize) -> Option<(ReferentialAction, usize)> {
    let first = word_text(toks.get(start)?)?;
    if first.eq_ignore_ascii_case("set") || first.eq_ignore_ascii_case("no") {
        let second = word_text(toks.get(start + 1)?)?;
        let action = ReferentialAction::parse(&format!("{} {}", first, second))?;
        Some((action, start + 2))
    } else {
        Some((ReferentialAction::parse(first)?, start + 1))
    }
}

fn ident_list(group: &str) -> Option<Vec<String>> {
    let inner = group.strip_prefix('(')?.strip_suffix(')')?;
    let mut out = Vec::new();
    for item in split_top_level(inner) {
        let toks = tokenize(&item);
        out.push(toks.first()?.ident_text()?.to_string());
    }
    if out.is_empty() {
        None
    } else {
        Some(out)
    }
}

// ---------------------------------------------------------------------------
// Table options
// ---------------------------------------------------------------------------

fn parse_options(table: &str, tail: &str) -> TableOptions {
    let toks = tokenize(tail);
    let mut options = TableOptions::default();
    let mut warned: BTreeSet<String> = BTreeSet::new();
    let mut i = 0;

    while i < toks.len() {
        let Some(key) = word_text(&toks[i]).map(str::to_ascii_lowercase) else {
            i += 1;
            continue;
        };
        match key.as_str() {
            "engine" => {
                let (value, next) = option_value(&toks, i + 1);
                options.engine = value;
                i = next;
            }
            "default" => {
                // DEFAULT CHARSET=... or DEFAULT CHARACTER SET=...
                i += 1;
                continue;
            }
            "charset" => {
                let (value, next) = option_value(&toks, i + 1);
                options.default_charset = value;
                i = next;
            }
            "character" => {
                if matches!(toks.get(i + 1), Some(t) if t.is_word("set")) {
                    let (value, next) = option_value(&toks, i + 2);
                    options.default_charset = value;
                    i = next;
                } else {
                    i += 1;
                }
            }
            "collate" => {
                let (value, next) = option_value(&toks, i + 1);
                options.collate = value;
                i = next;
            }
            "comment" => {
                let (value, next) = option_value(&toks, i + 1);
                options.comment = value.map(|v| unquote_str(&v));
                i = next;
            }
            "auto_increment" => {
                // Counter state, not schema. Parsed and discarded.
                let (_, next) = option_value(&toks, i + 1);
                i = next;
            }
            other => {
                if warned.insert(other.to_string()) {
                    warn!(table, option = other, "ignoring unrecognized table option");
                }
                let (_, next) = option_value(&toks, i + 1);
                i = next;
            }
        }
    }

    options
}

/// Consume an optional `=` and one value token.
fn option_value(toks: &[Tok], start: usize) -> (Option<String>, usize) {
    let mut i = start;
    if matches!(toks.get(i), Some(Tok::Sym('='))) {
        i += 1;
    }
    match toks.get(i) {
        Some(Tok::Word(w)) => (Some(w.clone()), i + 1),
        Some(Tok::Str(s)) => (Some(s.clone()), i + 1),
        Some(Tok::Ident(id)) => (Some(id.clone()), i + 1),
        Some(Tok::Group(g)) => (Some(g.clone()), i + 1),
        _ => (None, i + 1),
    }
}
