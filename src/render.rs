//! Terminal rendering of rewind cards.

use crate::types::{PersonalStats, ProcessedStats};
use chrono::{Datelike, Local};
use nu_ansi_term::{Color, Style as AnsiStyle};

const ACCENT_COLOR: Color = Color::Rgb(244, 170, 214);
const EDGE_COLOR: Color = Color::Rgb(251, 176, 120);
const DIM_COLOR: Color = Color::Rgb(150, 138, 160);
const BAR_FILLED_COLOR: Color = Color::Rgb(192, 132, 252);
const BAR_EMPTY_COLOR: Color = Color::Rgb(80, 70, 92);

const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];
const TOP_BADGES: usize = 5;
const RESPONSE_EXTREMES: usize = 3;
const PREVIEW_CHARS: usize = 120;
const BAR_WIDTH: usize = 20;

/// How cards are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum CardVariant {
    /// Cards one after another.
    #[default]
    Compact,
    /// One card per page with a page marker.
    Story,
}

#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub variant: CardVariant,
    pub color: bool,
    /// Year used in the overview title when the stats carry none.
    pub fallback_year: i32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            variant: CardVariant::Compact,
            color: true,
            fallback_year: Local::now().year(),
        }
    }
}

/// Styles text, or passes it through untouched when colour is off.
#[derive(Debug, Clone, Copy)]
struct Palette {
    color: bool,
}

impl Palette {
    fn paint(&self, style: AnsiStyle, text: &str) -> String {
        if self.color {
            style.paint(text).to_string()
        } else {
            text.to_string()
        }
    }

    fn accent(&self, text: &str) -> String {
        self.paint(AnsiStyle::new().fg(ACCENT_COLOR), text)
    }

    fn heading(&self, text: &str) -> String {
        self.paint(AnsiStyle::new().fg(ACCENT_COLOR).bold(), text)
    }

    fn strong(&self, text: &str) -> String {
        self.paint(AnsiStyle::new().bold(), text)
    }

    fn dim(&self, text: &str) -> String {
        self.paint(AnsiStyle::new().fg(DIM_COLOR), text)
    }

    fn edge(&self, text: &str) -> String {
        self.paint(AnsiStyle::new().fg(EDGE_COLOR), text)
    }

    fn rule(&self) -> String {
        self.edge("────────────────────────────────")
    }

    fn bar(&self, fraction: f64) -> String {
        let fraction = if fraction.is_finite() {
            fraction.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let filled = (fraction * BAR_WIDTH as f64).round() as usize;
        let filled_part = "█".repeat(filled);
        let empty_part = "░".repeat(BAR_WIDTH - filled);
        format!(
            "{}{}",
            self.paint(AnsiStyle::new().fg(BAR_FILLED_COLOR), &filled_part),
            self.paint(AnsiStyle::new().fg(BAR_EMPTY_COLOR), &empty_part)
        )
    }
}

struct Card {
    icon: &'static str,
    title: String,
    lines: Vec<String>,
}

impl Card {
    fn render(&self, palette: &Palette) -> String {
        let mut output = String::new();
        output.push_str(&palette.rule());
        output.push('\n');
        output.push_str(&format!(
            "{} {}\n",
            palette.accent(self.icon),
            palette.heading(&self.title)
        ));
        output.push_str(&palette.rule());
        output.push('\n');
        for line in &self.lines {
            output.push_str(line);
            output.push('\n');
        }
        output
    }
}

/// Render every card that applies to `stats`.
pub fn render_cards(stats: &ProcessedStats, options: &RenderOptions) -> String {
    let palette = Palette {
        color: options.color,
    };
    let mut cards = vec![
        overview_card(stats, &palette, options.fallback_year),
        top_chatters_card(stats, &palette),
        rhythm_card(stats, &palette),
    ];
    if let Some(card) = personal_card(stats, &palette) {
        cards.push(card);
    }

    match options.variant {
        CardVariant::Compact => cards
            .iter()
            .map(|card| card.render(&palette))
            .collect::<Vec<_>>()
            .join("\n"),
        CardVariant::Story => {
            let total = cards.len();
            cards
                .iter()
                .enumerate()
                .map(|(index, card)| {
                    format!(
                        "{}\n{}",
                        palette.dim(&format!("[{}/{}]", index + 1, total)),
                        card.render(&palette)
                    )
                })
                .collect::<Vec<_>>()
                .join("\n\n\n")
        }
    }
}

fn overview_card(stats: &ProcessedStats, palette: &Palette, fallback_year: i32) -> Card {
    let year = stats
        .rewind_year()
        .map(|year| year.to_string())
        .unwrap_or_else(|| fallback_year.to_string());
    let title = format!("{} in {}", year, stats.chat_title().unwrap_or("Chat"));

    let busiest_day = stats
        .busiest_dow()
        .first()
        .and_then(|(day, _)| WEEKDAYS.get(*day).copied())
        .unwrap_or("—");

    let mut lines = vec![
        palette.strong(&format_count(stats.total_messages())),
        palette.dim("total messages"),
        String::new(),
        format!(
            "{}  {}",
            palette.strong(&format_number(stats.longest_streak_days())),
            palette.dim("longest streak (days)")
        ),
        format!("{}  {}", palette.strong(busiest_day), palette.dim("busiest day")),
    ];

    let badges: Vec<String> = stats
        .ranked_senders()
        .iter()
        .take(TOP_BADGES)
        .enumerate()
        .map(|(index, sender)| {
            format!(
                "[#{} {} • {}]",
                index + 1,
                sender.name,
                format_number(sender.count)
            )
        })
        .collect();
    if !badges.is_empty() {
        lines.push(String::new());
        lines.push(badges.join(" "));
    }

    if let Some(message) = stats.most_reacted_message() {
        let initial: String = message
            .sender
            .chars()
            .next()
            .map(|ch| ch.to_uppercase().collect())
            .unwrap_or_default();
        lines.push(String::new());
        lines.push(palette.dim("Most reacted message"));
        lines.push(format!(
            "({}) {}",
            palette.accent(&initial),
            palette.strong(&message.sender)
        ));
        lines.push(format!("  “{}”", truncate_preview(&message.content)));
        if let Some(reactions) = message.reaction_count {
            lines.push(format!("  ♥ {}", format_number(reactions)));
        }
    }

    Card {
        icon: "♛",
        title,
        lines,
    }
}

fn top_chatters_card(stats: &ProcessedStats, palette: &Palette) -> Card {
    let senders = stats.ranked_senders();
    let total = stats.total_messages();
    let lines = if senders.is_empty() {
        vec![palette.dim("no senders recorded")]
    } else {
        let name_width = senders
            .iter()
            .map(|sender| sender.name.chars().count())
            .max()
            .unwrap_or(0);
        senders
            .iter()
            .enumerate()
            .map(|(index, sender)| {
                let share = if total > 0.0 { sender.count / total } else { 0.0 };
                format!(
                    "{} {:<width$} {} {} {}",
                    palette.accent(&format!("{:>2}.", index + 1)),
                    sender.name,
                    palette.bar(share),
                    format_count(sender.count),
                    palette.dim(&format!("({:.1}%)", share * 100.0)),
                    width = name_width
                )
            })
            .collect()
    };

    Card {
        icon: "★",
        title: "Top Chatters".to_string(),
        lines,
    }
}

fn rhythm_card(stats: &ProcessedStats, palette: &Palette) -> Card {
    let days = stats.busiest_dow();
    let max = days.iter().map(|(_, count)| *count).fold(0.0, f64::max);
    let lines = if days.is_empty() {
        vec![palette.dim("no weekly rhythm recorded")]
    } else {
        days.iter()
            .map(|(day, count)| {
                let label = WEEKDAYS.get(*day).copied().unwrap_or("?");
                let fraction = if max > 0.0 { count / max } else { 0.0 };
                format!("{} {} {}", label, palette.bar(fraction), format_count(*count))
            })
            .collect()
    };

    Card {
        icon: "◷",
        title: "Weekly Rhythm".to_string(),
        lines,
    }
}

fn personal_card(stats: &ProcessedStats, palette: &Palette) -> Option<Card> {
    stats.account_owner()?;
    let personal = stats.personal_stats()?;

    let mut lines = Vec::new();

    if let Some(friend) = &personal.best_friend {
        lines.push(palette.dim("your best friend"));
        lines.push(format!("{} ♥", palette.strong(friend)));
        lines.push(palette.dim("Most reactions & messages exchanged"));
        lines.push(String::new());
    }

    lines.push(palette.dim("your activity"));
    lines.push(format!(
        "Rank      {}",
        palette.strong(
            &personal
                .your_rank
                .map(|rank| format!("#{}", format_number(rank)))
                .unwrap_or_else(|| "—".to_string())
        )
    ));
    lines.push(format!(
        "Messages  {}",
        palette.strong(
            &personal
                .your_message_count
                .map(format_count)
                .unwrap_or_else(|| "—".to_string())
        )
    ));
    if let Some(level) = &personal.your_activity_level {
        lines.push(format!("Level     {}", palette.accent(level)));
    }
    if let Some(percentage) = personal.your_percentage {
        lines.push(format!(
            "{} {}",
            palette.bar(percentage.min(100.0) / 100.0),
            palette.dim(&format!("{:.1}% of all messages", percentage))
        ));
    }

    if let Some(emoji) = &personal.your_most_received_emoji {
        lines.push(String::new());
        lines.push(palette.dim("most received"));
        let mut line = match emoji.count {
            Some(count) => format!("{} {} times", emoji.emoji, format_number(count)),
            None => emoji.emoji.clone(),
        };
        if let Some(reactor) = &emoji.top_reactor {
            line.push_str(&palette.dim(&format!(", mostly from {reactor}")));
        }
        lines.push(line);
    }

    if let Some(hour) = personal.your_active_hour {
        lines.push(String::new());
        lines.push(palette.dim("peak hour"));
        lines.push(format!(
            "{} {}",
            palette.strong(&format_hour(hour)),
            palette.dim("Most active time")
        ));
    }

    lines.extend(response_time_lines(&personal, palette));

    Some(Card {
        icon: "☺",
        title: "Your Stats".to_string(),
        lines,
    })
}

fn response_time_lines(personal: &PersonalStats, palette: &Palette) -> Vec<String> {
    let mut times = personal.your_response_times.clone();
    if times.is_empty() {
        return Vec::new();
    }

    let by_minutes = |a: &(String, f64), b: &(String, f64)| {
        a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal)
    };
    times.sort_by(by_minutes);
    let quickest: Vec<_> = times.iter().take(RESPONSE_EXTREMES).cloned().collect();
    times.sort_by(|a, b| by_minutes(b, a));
    let slowest: Vec<_> = times.iter().take(RESPONSE_EXTREMES).cloned().collect();

    let mut lines = vec![String::new(), palette.dim("your response times")];
    for (label, entries) in [("⚡ Quickest", quickest), ("◔ Slowest", slowest)] {
        lines.push(palette.accent(label));
        for (name, minutes) in entries {
            lines.push(format!(
                "  {} {}",
                name,
                palette.dim(&format_response_time(minutes))
            ));
        }
    }
    lines
}

/// Format a count with thousands separators, e.g. `12,345`.
pub fn format_count(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let negative = value < 0.0;
    let rounded = (value.abs() * 1000.0).round() / 1000.0;
    let whole = rounded.trunc() as u64;
    let fraction = rounded - whole as f64;

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if fraction > 0.0 {
        let decimals = format!("{:.3}", fraction);
        let decimals = decimals.trim_start_matches('0').trim_end_matches('0');
        grouped.push_str(decimals);
    }

    if negative && (whole > 0 || fraction > 0.0) {
        format!("-{grouped}")
    } else {
        grouped
    }
}

/// Format a number without separators, dropping a zero fraction.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.is_finite() {
        format!("{:.0}", value)
    } else {
        value.to_string()
    }
}

/// Format an hour of the day (0-23) as `h:00 AM/PM`.
pub fn format_hour(hour: u32) -> String {
    let display = match hour % 12 {
        0 => 12,
        h => h,
    };
    let period = if hour < 12 { "AM" } else { "PM" };
    format!("{display}:00 {period}")
}

/// Format a response time given in minutes.
pub fn format_response_time(minutes: f64) -> String {
    if minutes < 1.0 {
        return "< 1 min".to_string();
    }
    if minutes < 60.0 {
        return format!("{} min", minutes.round());
    }
    let hours = (minutes / 60.0).floor() as u64;
    let mins = (minutes % 60.0).round() as u64;
    if hours < 24 {
        return if mins > 0 {
            format!("{hours}h {mins}m")
        } else {
            format!("{hours}h")
        };
    }
    let days = hours / 24;
    let remaining_hours = hours % 24;
    if remaining_hours > 0 {
        format!("{days}d {remaining_hours}h")
    } else {
        format!("{days}d")
    }
}

/// Shorten a message preview to 120 characters followed by `...`.
pub fn truncate_preview(content: &str) -> String {
    if content.chars().count() > PREVIEW_CHARS {
        let mut preview: String = content.chars().take(PREVIEW_CHARS).collect();
        preview.push_str("...");
        preview
    } else {
        content.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::parse_processed_stats;
    use serde_json::json;

    fn plain(variant: CardVariant) -> RenderOptions {
        RenderOptions {
            variant,
            color: false,
            fallback_year: 2024,
        }
    }

    fn stats(value: serde_json::Value) -> ProcessedStats {
        parse_processed_stats(&value).expect("processed stats shape")
    }

    #[test]
    fn hours_use_twelve_hour_clock() {
        assert_eq!(format_hour(0), "12:00 AM");
        assert_eq!(format_hour(9), "9:00 AM");
        assert_eq!(format_hour(12), "12:00 PM");
        assert_eq!(format_hour(13), "1:00 PM");
        assert_eq!(format_hour(23), "11:00 PM");
    }

    #[test]
    fn response_times() {
        assert_eq!(format_response_time(0.4), "< 1 min");
        assert_eq!(format_response_time(12.6), "13 min");
        assert_eq!(format_response_time(60.0), "1h");
        assert_eq!(format_response_time(95.0), "1h 35m");
        assert_eq!(format_response_time(24.0 * 60.0), "1d");
        assert_eq!(format_response_time(26.0 * 60.0 + 10.0), "1d 2h");
    }

    #[test]
    fn counts_get_thousands_separators() {
        assert_eq!(format_count(0.0), "0");
        assert_eq!(format_count(999.0), "999");
        assert_eq!(format_count(1000.0), "1,000");
        assert_eq!(format_count(1234567.0), "1,234,567");
        assert_eq!(format_count(1234.5), "1,234.5");
        assert_eq!(format_count(-2500.0), "-2,500");
    }

    #[test]
    fn previews_are_truncated_by_characters() {
        let short = "hello";
        assert_eq!(truncate_preview(short), "hello");

        let long = "é".repeat(130);
        let preview = truncate_preview(&long);
        assert_eq!(preview.chars().count(), 123);
        assert!(preview.ends_with("..."));
    }

    #[test]
    fn overview_defaults_title_year_and_days() {
        let output = render_cards(
            &stats(json!({"total_messages": 12345, "per_sender": {}})),
            &plain(CardVariant::Compact),
        );
        assert!(output.contains("2024 in Chat"));
        assert!(output.contains("12,345"));
        assert!(output.contains("—  busiest day"));
        assert!(output.contains("0  longest streak (days)"));
    }

    #[test]
    fn overview_lists_top_five_badges() {
        let output = render_cards(
            &stats(json!({
                "total_messages": 28,
                "per_sender": {"A": 1, "B": 7, "C": 3, "D": 6, "E": 5, "F": 6},
                "chat_title": "Besties",
                "rewind_year": 2023,
                "busiest_dow": [[4, 10], [5, 8]],
                "longest_streak_days": 12
            })),
            &plain(CardVariant::Compact),
        );
        assert!(output.contains("2023 in Besties"));
        assert!(output.contains("[#1 B • 7] [#2 D • 6] [#3 F • 6] [#4 E • 5] [#5 C • 3]"));
        assert!(!output.contains("#6"));
        assert!(output.contains("Fri  busiest day"));
        assert!(output.contains("12  longest streak (days)"));
    }

    #[test]
    fn most_reacted_message_is_previewed() {
        let output = render_cards(
            &stats(json!({
                "total_messages": 1,
                "per_sender": {"bob": 1},
                "most_reacted_message": {
                    "sender": "bob",
                    "content": "x".repeat(200),
                    "reaction_count": 9
                }
            })),
            &plain(CardVariant::Compact),
        );
        assert!(output.contains("(B) bob"));
        assert!(output.contains(&format!("{}...", "x".repeat(120))));
        assert!(output.contains("♥ 9"));
    }

    #[test]
    fn personal_card_needs_owner_and_stats() {
        let without_owner = render_cards(
            &stats(json!({
                "total_messages": 1,
                "per_sender": {},
                "personal_stats": {"your_rank": 1}
            })),
            &plain(CardVariant::Compact),
        );
        assert!(!without_owner.contains("Your Stats"));

        let without_stats = render_cards(
            &stats(json!({
                "total_messages": 1,
                "per_sender": {},
                "account_owner": "Alice"
            })),
            &plain(CardVariant::Compact),
        );
        assert!(!without_stats.contains("Your Stats"));
    }

    #[test]
    fn personal_card_shows_response_extremes() {
        let output = render_cards(
            &stats(json!({
                "total_messages": 100,
                "per_sender": {"Alice": 60, "Bob": 40},
                "account_owner": "Alice",
                "personal_stats": {
                    "best_friend": {"name": "Bob"},
                    "your_rank": 1,
                    "your_message_count": 1500,
                    "your_activity_level": "Chatterbox",
                    "your_percentage": 60.04,
                    "your_most_received_emoji": {"emoji": "😂", "count": 42, "top_reactor": "Bob"},
                    "your_active_hour": 22,
                    "your_response_times": {"Bob": 0.5, "Carol": 95, "Dan": 3000, "Eve": 12, "Fay": 30}
                }
            })),
            &plain(CardVariant::Compact),
        );
        assert!(output.contains("Your Stats"));
        assert!(output.contains("Bob ♥"));
        assert!(output.contains("#1"));
        assert!(output.contains("1,500"));
        assert!(output.contains("Chatterbox"));
        assert!(output.contains("60.0% of all messages"));
        assert!(output.contains("😂 42 times, mostly from Bob"));
        assert!(output.contains("10:00 PM"));

        let quickest = output.find("Quickest").unwrap();
        let slowest = output.find("Slowest").unwrap();
        let quick_section = &output[quickest..slowest];
        assert!(quick_section.contains("Bob < 1 min"));
        assert!(quick_section.contains("Eve 12 min"));
        assert!(quick_section.contains("Fay 30 min"));
        assert!(!quick_section.contains("Dan"));
        let slow_section = &output[slowest..];
        assert!(slow_section.contains("Dan 2d 2h"));
        assert!(slow_section.contains("Carol 1h 35m"));
        assert!(!slow_section.contains("Bob"));
    }

    #[test]
    fn tied_senders_keep_file_order() {
        let output = render_cards(
            &stats(json!({"total_messages": 10, "per_sender": {"Zed": 5, "Amy": 5}})),
            &plain(CardVariant::Compact),
        );
        assert!(output.contains("[#1 Zed • 5] [#2 Amy • 5]"));

        let zed = output.rfind("Zed").unwrap();
        let amy = output.rfind("Amy").unwrap();
        assert!(zed < amy);
    }

    #[test]
    fn malformed_personal_fields_are_skipped_individually() {
        let output = render_cards(
            &stats(json!({
                "total_messages": 100,
                "per_sender": {"Alice": 60, "Bob": 40},
                "account_owner": "Alice",
                "personal_stats": {
                    "best_friend": {"name": "Bob"},
                    "your_rank": 1,
                    "your_message_count": "lots",
                    "your_percentage": -12.5,
                    "your_most_received_emoji": {"emoji": "🔥", "count": "many"},
                    "your_active_hour": 22.0,
                    "your_response_times": {"Bob": 4, "Carol": "slow"}
                }
            })),
            &plain(CardVariant::Compact),
        );
        assert!(output.contains("Your Stats"));
        assert!(output.contains("Bob ♥"));
        assert!(output.contains("Rank      #1"));
        assert!(output.contains("Messages  —"));
        assert!(output.contains("🔥"));
        assert!(!output.contains("many"));
        assert!(output.contains("10:00 PM"));
        assert!(output.contains("Bob 4 min"));
        assert!(!output.contains("Carol"));
    }

    #[test]
    fn out_of_range_hour_is_dropped() {
        let output = render_cards(
            &stats(json!({
                "total_messages": 1,
                "per_sender": {"Alice": 1},
                "account_owner": "Alice",
                "personal_stats": {"your_rank": 2, "your_active_hour": 24}
            })),
            &plain(CardVariant::Compact),
        );
        assert!(output.contains("Rank      #2"));
        assert!(!output.contains("peak hour"));
    }

    #[test]
    fn odd_reaction_counts_still_show_the_message() {
        for reactions in [json!(-3), json!("nine"), json!(2.5)] {
            let output = render_cards(
                &stats(json!({
                    "total_messages": 1,
                    "per_sender": {"bob": 1},
                    "most_reacted_message": {
                        "sender": "bob",
                        "content": "see you there",
                        "reaction_count": reactions
                    }
                })),
                &plain(CardVariant::Compact),
            );
            assert!(output.contains("Most reacted message"));
            assert!(output.contains("“see you there”"));
        }
    }

    #[test]
    fn negative_and_fractional_reactions_are_printed_as_given() {
        let output = render_cards(
            &stats(json!({
                "total_messages": 1,
                "per_sender": {"bob": 1},
                "most_reacted_message": {"sender": "bob", "content": "hi", "reaction_count": -3}
            })),
            &plain(CardVariant::Compact),
        );
        assert!(output.contains("♥ -3"));
    }

    #[test]
    fn story_variant_numbers_pages() {
        let output = render_cards(
            &stats(json!({"total_messages": 3, "per_sender": {"A": 3}})),
            &plain(CardVariant::Story),
        );
        assert!(output.contains("[1/3]"));
        assert!(output.contains("[3/3]"));
        assert!(!output.contains("[4/3]"));
    }

    #[test]
    fn plain_output_has_no_escape_codes() {
        let output = render_cards(
            &stats(json!({"total_messages": 3, "per_sender": {"A": 3}})),
            &plain(CardVariant::Compact),
        );
        assert!(!output.contains('\u{1b}'));
    }
}
