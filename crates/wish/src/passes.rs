// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The five passes.

use crate::predicates::{predicate_name, Predicate, PredicateCheck, PredicateRegistry};
use crate::state::{PassResult, TaskCard, WishPipeline};
use hfo_model::{GenerateRequest, PrimaryClient};
use hfo_store::Ssot;
use serde_json::json;
use std::time::Duration;

const FEATURE_SYSTEM_PROMPT: &str = "You transform operator intent into precise, testable \
scenario specifications. Every scenario MUST have Given, When, Then clauses with concrete \
values. Include at least one happy-path and one invariant scenario. Output ONLY the \
feature file content, starting with 'Feature:'.";

/// Deterministic Pass-1 output for dry runs: testable without a model.
pub fn feature_template(intent_text: &str) -> String {
    let safe: String = intent_text
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == ' ')
        .take(60)
        .collect();
    let feature_name = if safe.trim().is_empty() {
        "Dry Run Feature".to_string()
    } else {
        safe.trim().to_string()
    };
    format!(
        "Feature: {feature_name}\n\
         \x20 As the fabric operator\n\
         \x20 I want to verify {intent_text}\n\
         \x20 So that correctness is structurally enforced\n\n\
         \x20 Scenario: Happy path\n\
         \x20   Given the system is in a known good state\n\
         \x20   When the verification for \"{intent_text}\" is executed\n\
         \x20   Then the result is GRANTED\n\n\
         \x20 Scenario: Invariant on empty input\n\
         \x20   Given no input is provided for the check\n\
         \x20   When the verification is attempted\n\
         \x20   Then the result is REJECTED\n\n\
         \x20 Scenario: Edge case on partial state\n\
         \x20   Given the system has partial configuration\n\
         \x20   When the verification for \"{intent_text}\" is executed\n\
         \x20   Then the result is DENIED\n"
    )
}

/// Syntactic validation of Pass-1 output: at least one Feature section,
/// at least two scenarios, every scenario carrying all three clauses.
pub fn validate_feature_text(content: &str) -> Result<usize, Vec<String>> {
    let mut errors = Vec::new();
    if !content.contains("Feature:") {
        errors.push("missing 'Feature:' declaration".to_string());
    }

    let scenarios: Vec<&str> = content.split("Scenario:").skip(1).collect();
    if scenarios.len() < 2 {
        errors.push(format!(
            "need at least 2 scenarios, found {}",
            scenarios.len()
        ));
    }
    for (index, scenario) in scenarios.iter().enumerate() {
        for clause in ["Given", "When", "Then"] {
            if !scenario.contains(clause) {
                errors.push(format!("scenario {}: missing '{clause}' clause", index + 1));
            }
        }
    }

    if errors.is_empty() {
        Ok(scenarios.len())
    } else {
        Err(errors)
    }
}

/// Pass 1: intent -> structured scenarios.
pub async fn run_pass_1(
    pipeline: &mut WishPipeline,
    primary: &PrimaryClient,
    model: &str,
    dry_run: bool,
) -> PassResult {
    if pipeline.intent_text.trim().is_empty() {
        return PassResult::rejected(1, "empty intent");
    }

    let (feature_content, ai_model, latency_ms) = if dry_run {
        (feature_template(&pipeline.intent_text), "dry-run-stub".to_string(), 0.0)
    } else {
        let request = GenerateRequest::new(
            model,
            &format!(
                "Operator intent:\n  \"{}\"\n\nWrite a complete feature file capturing this \
                 intent with concrete Given/When/Then scenarios.",
                pipeline.intent_text
            ),
        )
        .system(FEATURE_SYSTEM_PROMPT)
        .num_predict(4096)
        .deadline(Duration::from_secs(120));
        match primary.generate(&request).await {
            Ok(generated) => (generated.text, model.to_string(), generated.latency_ms),
            Err(e) => return PassResult::rejected(1, &format!("model unavailable: {e}")),
        }
    };

    match validate_feature_text(&feature_content) {
        Ok(scenario_count) => {
            pipeline.feature_content = feature_content.clone();
            PassResult::ok(
                1,
                json!({
                    "scenario_count": scenario_count,
                    "ai_model": ai_model,
                    "ai_latency_ms": latency_ms,
                    "feature_chars": feature_content.len(),
                }),
            )
        }
        Err(errors) => PassResult::rejected(1, &format!("validation failed: {}", errors.join("; "))),
    }
}

/// Extract one card per scenario. Clause text comes from the first
/// Given/When/Then line of each block.
pub fn extract_task_cards(wish_id: &str, feature_content: &str) -> Vec<TaskCard> {
    let mut cards = Vec::new();
    for (index, block) in feature_content.split("Scenario:").skip(1).enumerate() {
        let mut lines = block.lines();
        let name = lines.next().unwrap_or("").trim().to_string();

        let clause = |prefix: &str| -> String {
            block
                .lines()
                .map(str::trim)
                .find(|line| line.starts_with(prefix))
                .map(|line| line[prefix.len()..].trim().to_string())
                .unwrap_or_default()
        };

        cards.push(TaskCard {
            task_id: format!("WISH-{wish_id}-{index:02}"),
            scenario_name: name,
            precondition: clause("Given"),
            trigger: clause("When"),
            outcome: clause("Then"),
            port_mapping: Vec::new(),
            target_artifact: None,
        });
    }
    cards
}

/// Pass 2: scenarios -> task cards.
pub fn run_pass_2(pipeline: &mut WishPipeline) -> PassResult {
    if pipeline.feature_content.is_empty() {
        return PassResult::rejected(2, "no feature content from pass 1");
    }
    let cards = extract_task_cards(&pipeline.wish_id, &pipeline.feature_content);
    if cards.is_empty() {
        return PassResult::rejected(2, "no scenarios extracted");
    }
    let count = cards.len();
    pipeline.task_cards = cards;
    PassResult::ok(2, json!({"card_count": count}))
}

/// Pass 3: cards -> registered predicates. Stubs always pass until real
/// predicate logic replaces them; the registration itself is what Pass 4
/// observes.
pub fn run_pass_3(pipeline: &mut WishPipeline, registry: &mut PredicateRegistry) -> PassResult {
    if pipeline.task_cards.is_empty() {
        return PassResult::rejected(3, "no task cards from pass 2");
    }
    let mut names = Vec::new();
    for card in &pipeline.task_cards {
        let name = predicate_name(&card.task_id);
        registry.register(Predicate {
            name: name.clone(),
            given: card.precondition.clone(),
            when: card.trigger.clone(),
            then: card.outcome.clone(),
            check: PredicateCheck::AlwaysPass,
        });
        names.push(name);
    }
    pipeline.predicate_names = names.clone();
    PassResult::ok(
        3,
        json!({"registration_count": names.len(), "registrations": names}),
    )
}

/// Pass 4: predicates -> verdicts. DENIED if any predicate is not
/// granted or not found in the registry.
pub fn run_pass_4(
    pipeline: &WishPipeline,
    registry: &PredicateRegistry,
    ssot: &Ssot,
) -> PassResult {
    if pipeline.predicate_names.is_empty() {
        return PassResult::rejected(4, "no predicates registered by pass 3");
    }

    let mut verdicts = Vec::new();
    let mut denied = 0;
    for name in &pipeline.predicate_names {
        match registry.evaluate(name, ssot) {
            Some(verdict) => {
                if verdict.verdict != "GRANTED" {
                    denied += 1;
                }
                verdicts.push(serde_json::to_value(&verdict).unwrap_or_default());
            }
            None => {
                denied += 1;
                verdicts.push(json!({
                    "name": name,
                    "verdict": "DENIED",
                    "violations": ["predicate not registered"],
                }));
            }
        }
    }

    let data = json!({
        "verdicts": verdicts,
        "granted": pipeline.predicate_names.len() - denied,
        "denied": denied,
    });
    if denied > 0 {
        PassResult::denied(4, data, &format!("{denied} predicate(s) denied"))
    } else {
        PassResult::ok(4, data)
    }
}

/// Pass 5: proof -> artifact. A deployment receipt only; any artifact
/// this pass ever produces must not violate a Pass-4 predicate.
pub fn run_pass_5(pipeline: &mut WishPipeline) -> PassResult {
    let receipt = format!(
        "artifact-receipt:{}:{}_checks_granted",
        pipeline.wish_id,
        pipeline.predicate_names.len()
    );
    pipeline.artifacts.push(receipt.clone());
    PassResult::ok(5, json!({"receipt": receipt, "generated": false}))
}

#[cfg(test)]
#[path = "passes_tests.rs"]
mod tests;
