use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use textwrap::wrap;

use crate::comments::CommentTree;
use crate::feed::FeedSession;
use crate::hackernews::{Item, ItemKind};
use crate::polls::PollBoard;
use crate::text;

pub const COLOR_TEXT_PRIMARY: Color = Color::Rgb(205, 214, 244);
pub const COLOR_TEXT_SECONDARY: Color = Color::Rgb(166, 173, 200);
pub const COLOR_ACCENT: Color = Color::Rgb(137, 180, 250);
pub const COLOR_SUCCESS: Color = Color::Rgb(166, 227, 161);
pub const COLOR_ERROR: Color = Color::Rgb(243, 139, 168);

const INDENT_PER_LEVEL: usize = 2;
const COMMENT_DEPTH_COLORS: [Color; 6] = [
    Color::Rgb(250, 179, 135),
    Color::Rgb(166, 227, 161),
    Color::Rgb(203, 166, 247),
    Color::Rgb(245, 194, 231),
    Color::Rgb(137, 220, 235),
    Color::Rgb(249, 226, 175),
];

fn comment_depth_color(depth: usize) -> Color {
    COMMENT_DEPTH_COLORS[depth % COMMENT_DEPTH_COLORS.len()]
}

/// What activating a row acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Post(i64),
    Comment(i64),
}

impl Target {
    pub fn id(&self) -> i64 {
        match self {
            Target::Post(id) | Target::Comment(id) => *id,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Row {
    pub target: Target,
    pub link: String,
    pub lines: Vec<Line<'static>>,
}

impl Row {
    pub fn height(&self) -> usize {
        self.lines.len()
    }

    pub fn plain_text(&self) -> String {
        self.lines
            .iter()
            .map(|line| {
                line.spans
                    .iter()
                    .map(|span| span.content.as_ref())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Flattens the feed, its expanded threads and poll blocks into rows.
pub fn feed_rows(
    session: &FeedSession,
    tree: &CommentTree,
    polls: &PollBoard,
    width: usize,
) -> Vec<Row> {
    let width = width.max(20);
    let mut rows = Vec::new();
    for post in session.posts() {
        rows.push(post_row(post, tree, polls, width));
        for visible in tree.visible(post.id) {
            if let Some(node) = tree.node(visible.id) {
                rows.push(comment_row(&node.item, visible.depth, tree, width));
            }
        }
    }
    rows
}

fn wrapped(text: &str, width: usize, indent: &str, style: Style) -> Vec<Line<'static>> {
    let available = width.saturating_sub(indent.len()).max(10);
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        if paragraph.trim().is_empty() {
            lines.push(Line::from(""));
            continue;
        }
        for piece in wrap(paragraph, available) {
            lines.push(Line::from(vec![
                Span::raw(indent.to_string()),
                Span::styled(piece.into_owned(), style),
            ]));
        }
    }
    lines
}

pub fn post_row(post: &Item, tree: &CommentTree, polls: &PollBoard, width: usize) -> Row {
    let primary = Style::default().fg(COLOR_TEXT_PRIMARY);
    let secondary = Style::default().fg(COLOR_TEXT_SECONDARY);
    let link = post.link();

    let title = post.title.clone().unwrap_or_default();
    let mut lines = wrapped(
        &title,
        width,
        "",
        primary.add_modifier(Modifier::BOLD),
    );
    lines.push(Line::from(Span::styled(
        link.clone(),
        Style::default().fg(COLOR_ACCENT),
    )));
    lines.push(Line::from(Span::styled(
        format!(
            "By {} | {} | {} points",
            post.by.as_deref().unwrap_or("unknown"),
            text::timestamp(post.time),
            post.score.unwrap_or(0)
        ),
        secondary,
    )));

    let body = post.text.as_deref().map(text::plain).unwrap_or_default();
    match post.kind {
        ItemKind::Job => {
            let description = if body.is_empty() {
                "No description available.".to_string()
            } else {
                body
            };
            lines.push(Line::from(Span::styled(
                "Job Posting:",
                primary.add_modifier(Modifier::BOLD),
            )));
            lines.extend(wrapped(&description, width, "", primary));
        }
        _ => {
            if !body.is_empty() {
                lines.extend(wrapped(&body, width, "", primary));
            }
        }
    }

    if post.kind == ItemKind::Poll {
        if let Some(options) = polls.options(post.id) {
            for (_, state) in options {
                let mut option_lines = state.lines().into_iter();
                if let Some(first) = option_lines.next() {
                    lines.extend(wrapped(&first, width, "  • ", primary));
                }
                for rest in option_lines {
                    lines.extend(wrapped(&rest, width, "    ", secondary));
                }
            }
        }
    }

    let label = tree
        .node(post.id)
        .map(|node| node.toggle_label())
        .unwrap_or_else(|| format!("Show Comments ({})", post.descendants.unwrap_or(0)));
    lines.push(Line::from(Span::styled(
        format!("[{label}]"),
        Style::default().fg(COLOR_ACCENT),
    )));
    lines.push(Line::from(""));

    Row {
        target: Target::Post(post.id),
        link,
        lines,
    }
}

fn comment_row(comment: &Item, depth: usize, tree: &CommentTree, width: usize) -> Row {
    let indent = " ".repeat((depth + 1) * INDENT_PER_LEVEL);
    let author = comment.by.as_deref().unwrap_or("unknown");
    let accent = Style::default().fg(comment_depth_color(depth));

    let mut lines = vec![Line::from(vec![
        Span::raw(indent.clone()),
        Span::styled(
            format!("[{}] ", text::avatar(author)),
            accent.add_modifier(Modifier::BOLD),
        ),
        Span::styled(author.to_string(), accent),
        Span::styled(
            format!("  {}", text::timestamp(comment.time)),
            Style::default().fg(COLOR_TEXT_SECONDARY),
        ),
    ])];
    let body = comment.text.as_deref().map(text::plain).unwrap_or_default();
    lines.extend(wrapped(
        &body,
        width,
        &indent,
        Style::default().fg(COLOR_TEXT_PRIMARY),
    ));
    if let Some(node) = tree.node(comment.id) {
        if node.has_toggle() {
            lines.push(Line::from(vec![
                Span::raw(indent.clone()),
                Span::styled(
                    format!("[{}]", node.toggle_label()),
                    Style::default().fg(COLOR_ACCENT),
                ),
            ]));
        }
    }

    Row {
        target: Target::Comment(comment.id),
        link: crate::hackernews::permalink(comment.id),
        lines,
    }
}
