//! Text and JSON rendering.

use anyhow::Result;
use foodshare_search::{Correction, EngineStats, SearchResponse, Suggestion};
use owo_colors::OwoColorize;
use serde::Serialize;

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn search(response: &SearchResponse, title_field: &str, json: bool) -> Result<()> {
    if json {
        return print_json(response);
    }

    for correction in &response.corrections {
        println!(
            "{} {} → {} ({:.0}%)",
            "Did you mean:".yellow(),
            correction.original,
            correction.corrected.bold(),
            correction.confidence * 100.0
        );
    }

    if response.results.is_empty() {
        println!("{}", "No results".dimmed());
    }

    for (rank, hit) in response.results.iter().enumerate() {
        let title = hit.document.get(title_field).and_then(|v| v.as_str()).unwrap_or(hit.id.as_str());
        println!(
            "{:>3}. {} {} [{}] {:.1}",
            rank + 1,
            title.bold(),
            format!("#{}", hit.id).dimmed(),
            hit.match_type.cyan(),
            hit.score
        );
    }

    if !response.suggestions.is_empty() {
        println!("{} {}", "Suggestions:".dimmed(), response.suggestions.join(", "));
    }

    println!(
        "{}",
        format!(
            "{} of {} results in {:.2} ms",
            response.results.len(),
            response.stats.total_found,
            response.stats.search_time_ms
        )
        .dimmed()
    );

    Ok(())
}

pub fn suggestions(suggestions: &[Suggestion], json: bool) -> Result<()> {
    if json {
        return print_json(suggestions);
    }

    for suggestion in suggestions {
        println!("{} {}", suggestion.text, format!("({})", suggestion.frequency).dimmed());
    }
    Ok(())
}

pub fn corrections(corrections: &[Correction], json: bool) -> Result<()> {
    if json {
        return print_json(corrections);
    }

    if corrections.is_empty() {
        println!("{}", "No corrections".dimmed());
    }
    for correction in corrections {
        println!(
            "{} {}",
            correction.corrected.green(),
            format!("distance {} confidence {:.2}", correction.distance, correction.confidence).dimmed()
        );
    }
    Ok(())
}

pub fn stats(stats: &EngineStats, json: bool) -> Result<()> {
    if json {
        return print_json(stats);
    }

    println!("{}", "Index".bold());
    println!("  Documents:   {}", stats.documents);
    println!("  Terms:       {}", stats.terms);
    println!("  Total words: {}", stats.total_words);
    println!("{}", "Language data".bold());
    println!("  Synonym groups: {}", stats.synonym_groups);
    println!("  Stop words:     {}", stats.stop_words);
    println!("  Phonetic rules: {}", stats.phonetic_rules);
    Ok(())
}
