// src/notify/format.rs
//! Plain-text price report sent to the chat.

use crate::quotes::types::Quote;

/// Static parts of the report header.
#[derive(Debug, Clone)]
pub struct ReportFormat {
    pub asset: String,
    pub fiat: String,
    pub volume: u32,
}

#[derive(Clone, Copy)]
enum Side {
    Buy,
    Sell,
}

impl ReportFormat {
    pub fn new(asset: &str, fiat: &str, volume: u32) -> Self {
        Self {
            asset: asset.to_string(),
            fiat: fiat.to_string(),
            volume,
        }
    }

    pub fn render(&self, best_buy: &[Quote], best_sell: &[Quote], timestamp: &str) -> String {
        let mut lines = vec![format!(
            "💵 {} en {} (volumen ref: {} {})",
            self.asset, self.fiat, self.volume, self.asset
        )];

        if best_buy.is_empty() {
            lines.push("🔽 Mejores para *comprar*: sin datos".to_string());
        } else {
            lines.push("🔽 Mejores para *comprar* (menor ask):".to_string());
            lines.extend(ranked_lines(best_buy, Side::Buy));
        }

        if best_sell.is_empty() {
            lines.push("\n🔼 Mejores para *vender*: sin datos".to_string());
        } else {
            lines.push("\n🔼 Mejores para *vender* (mayor bid):".to_string());
            lines.extend(ranked_lines(best_sell, Side::Sell));
        }

        lines.push(format!("\n⏱️ {timestamp}"));
        lines.join("\n")
    }
}

fn ranked_lines(rows: &[Quote], side: Side) -> impl Iterator<Item = String> + '_ {
    rows.iter().enumerate().map(move |(i, q)| {
        let price = match side {
            Side::Buy => q.ask,
            Side::Sell => q.bid,
        };
        format!("{}. {}: Bs {}", i + 1, q.source, format_price(price))
    })
}

/// Two decimals with comma thousands separators: `1234.5` -> `1,234.50`.
pub fn format_price(v: f64) -> String {
    let fixed = format!("{:.2}", v.abs());
    let (int_part, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    // `-0.00` is printed without a sign.
    let sign = if v < 0.0 && fixed.chars().any(|c| matches!(c, '1'..='9')) {
        "-"
    } else {
        ""
    };
    format!("{sign}{grouped}.{frac}")
}
