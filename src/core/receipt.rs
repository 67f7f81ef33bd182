//! Receipt formatter - turns a completed transaction into printable text.
//!
//! Everything here is pure: callers decide whether the returned strings are
//! printed, downloaded or shown on screen.

use crate::config::MerchantInfo;
use crate::models::Transaction;

/// Width of the plain-text receipt in characters.
pub const RECEIPT_WIDTH: usize = 40;

/// Number of id characters shown on a receipt.
pub const SHORT_ID_LEN: usize = 8;

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// First [`SHORT_ID_LEN`] characters of `id`, upper-cased.
#[must_use]
pub fn short_id(id: &str) -> String {
    id.chars().take(SHORT_ID_LEN).collect::<String>().to_uppercase()
}

/// Download name for the plain-text receipt, e.g. `receipt-1A2B3C4D.txt`.
#[must_use]
pub fn receipt_file_name(transaction: &Transaction) -> String {
    format!("receipt-{}.txt", short_id(&transaction.id))
}

/// Formats an amount with `,` thousands separators.
///
/// Cents are shown only when non-zero: `15000.0` is `"15,000"` and `12.5`
/// is `"12.50"`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn format_amount(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let fraction = cents % 100;

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    if fraction == 0 {
        format!("{sign}{grouped}")
    } else {
        format!("{sign}{grouped}.{fraction:02}")
    }
}

fn money(merchant: &MerchantInfo, amount: f64) -> String {
    format!("{}{}", merchant.currency_symbol, format_amount(amount))
}

/// `left` and `right` on one line, `right` flush with the receipt edge.
fn columns(left: &str, right: &str) -> String {
    let pad = RECEIPT_WIDTH.saturating_sub(left.chars().count() + right.chars().count());
    format!("{left}{}{right}", " ".repeat(pad.max(1)))
}

fn centered(text: &str) -> String {
    let pad = RECEIPT_WIDTH.saturating_sub(text.chars().count()) / 2;
    format!("{}{text}", " ".repeat(pad))
}

/// Plain-text receipt.
#[must_use]
pub fn to_text(transaction: &Transaction, merchant: &MerchantInfo) -> String {
    let rule = "-".repeat(RECEIPT_WIDTH);
    let mut lines = vec![
        centered(&merchant.name),
        centered(&merchant.address),
        centered(&merchant.phone),
        rule.clone(),
        format!("Receipt: {}", short_id(&transaction.id)),
        format!("Date: {}", transaction.date.format(DATE_FORMAT)),
        format!("Customer: {}", transaction.customer),
        rule.clone(),
    ];

    lines.extend(transaction.items.iter().map(|item| {
        columns(
            &format!("{} x {}", item.quantity, item.name),
            &money(merchant, item.subtotal()),
        )
    }));

    lines.push(rule.clone());
    lines.push(columns("TOTAL", &money(merchant, transaction.total)));
    lines.push(format!("Payment: {}", transaction.payment_method.label()));
    lines.push(rule);
    lines.push(centered(&merchant.footer));

    let mut text = lines.join("\n");
    text.push('\n');
    text
}

/// Escapes text for inclusion in HTML.
fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Printable HTML receipt, a complete document.
#[must_use]
pub fn to_html(transaction: &Transaction, merchant: &MerchantInfo) -> String {
    let rows: String = transaction
        .items
        .iter()
        .map(|item| {
            format!(
                "<tr><td>{} x {}</td><td class=\"amount\">{}</td></tr>\n",
                item.quantity,
                escape_html(&item.name),
                escape_html(&money(merchant, item.subtotal()))
            )
        })
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>Receipt {id}</title>
<style>
body {{ font-family: monospace; width: 300px; margin: 0 auto; }}
.header, .footer {{ text-align: center; }}
table {{ width: 100%; border-collapse: collapse; }}
.amount {{ text-align: right; }}
.total td {{ border-top: 1px dashed #000; font-weight: bold; }}
</style>
</head>
<body>
<div class="header">
<h2>{name}</h2>
<p>{address}<br>{phone}</p>
</div>
<p>Receipt: {id}<br>Date: {date}<br>Customer: {customer}</p>
<table>
{rows}<tr class="total"><td>TOTAL</td><td class="amount">{total}</td></tr>
</table>
<p>Payment: {payment}</p>
<div class="footer"><p>{footer}</p></div>
</body>
</html>
"#,
        id = escape_html(&short_id(&transaction.id)),
        name = escape_html(&merchant.name),
        address = escape_html(&merchant.address),
        phone = escape_html(&merchant.phone),
        date = transaction.date.format(DATE_FORMAT),
        customer = escape_html(&transaction.customer),
        total = escape_html(&money(merchant, transaction.total)),
        payment = transaction.payment_method.label(),
        footer = escape_html(&merchant.footer),
    )
}
