//! Centralized prompt definitions for the research stages
//!
//! Templates use `{name}` placeholders filled by [`render`]. Every prompt
//! asks for JSON whose field names match the payload types in
//! [`crate::research`].

/// System prompt shared by all stages.
pub const RESEARCH_SYSTEM_PROMPT: &str = r#"You are a careful research assistant. You find accurate, well-sourced information and say plainly when the evidence is thin.

Rules:
- Ground every claim in the provided sources
- Distinguish facts from inferences
- Acknowledge uncertainty and conflicting evidence
- Always respond with valid JSON only, no other text"#;

/// Query analysis and decomposition.
pub const QUERY_ANALYSIS_PROMPT: &str = r#"Analyze this research question and decompose it into independent, searchable sub-queries.

## Query
{query}

## Output Format
{
  "intent": "what the user wants to learn",
  "domain": "subject area",
  "entities": [{"name": "entity", "type": "PERSON|ORG|LOCATION|DATE|CONCEPT|PRODUCT|EVENT", "relevance": "primary|secondary"}],
  "complexity": "simple|medium|complex",
  "temporal_scope": "time frame or null",
  "sub_queries": [{"query": "searchable question", "purpose": "why it is needed", "priority": 1}]
}

Use 1 sub-query for simple questions and at most 5 for complex ones. Order sub-queries so foundational questions come first."#;

/// Reasoning and synthesis over retrieved sources.
pub const REASONING_PROMPT: &str = r#"Reason step by step about this research question using only the sources below, then synthesize an answer.

## Research Question
{query}

## Sources
{sources}

## Output Format
{
  "synthesis": "coherent answer that cites sources by number, e.g. [1]",
  "key_findings": ["one checkable claim per entry"],
  "reasoning_steps": [{"step_number": 1, "thought": "reasoning", "evidence": "which sources and what they say", "conclusion": "what follows"}],
  "gaps": ["information that is missing"],
  "confidence": 0.8
}"#;

/// Claim verification and source credibility assessment.
pub const VERIFICATION_PROMPT: &str = r#"Fact-check these claims against the sources and assess each source's credibility.

## Claims
{claims}

## Sources
{sources}

## Output Format
{
  "overall_confidence": 0.8,
  "trust_level": "high|medium|low",
  "claims": [{"content": "claim", "status": "verified|partially_verified|unverified|disputed", "confidence": 0.8, "supporting_sources": ["url"]}],
  "conflicts": [{"topic": "what disagrees", "conflict_type": "factual|interpretive|temporal|scope", "severity": "low|medium|high"}],
  "caveats": ["limitation the reader should know"],
  "source_assessments": [{"url": "source url exactly as given", "credibility_score": 0.7}]
}

A claim is verified only when at least two independent sources support it."#;

/// Citation formatting.
pub const CITATION_PROMPT: &str = r#"Format citations for these sources in {style} style.

## Sources
{sources}

## Content Being Cited
{content}

## Output Format
{
  "style": "{style}",
  "citations": [{"url": "source url", "formatted": "full reference entry", "in_text": "in-text marker"}],
  "bibliography": "all reference entries, one per line, sorted per the style"
}

Use "n.d." when no date is known. Do not invent authors."#;

/// Final report writing.
pub const OUTPUT_PROMPT: &str = r#"Write the final research report.

## Research Question
{query}

## Audience
{audience}

## Format
{format}

## Overall Confidence
{confidence}

## Findings
{findings}

## Sources
{sources}

## Output Format
{
  "summary": "2-4 sentence direct answer to the question",
  "report": "the full report in the requested format, citing sources by number",
  "followup_questions": ["natural next question"]
}

Match vocabulary and depth to the audience. State the confidence level and the main caveats."#;

/// Best-effort answer after a pipeline failure.
pub const FALLBACK_PROMPT: &str = r#"The research pipeline could not finish. Give the most useful answer you can from what is available, and be explicit about what is missing.

## Research Question
{query}

## Partial Findings
{available}

## What Failed
{failures}

## Output Format
{
  "response": "best-effort answer, clearly marked as incomplete",
  "confidence": 0.3,
  "completeness": 0.4,
  "limitations": ["what this answer cannot tell the user"]
}"#;

/// Fill `{name}` placeholders in a template.
///
/// Unknown placeholders are left as-is. Values are inserted verbatim and not
/// re-scanned, so a value containing `{query}` is not expanded.
pub fn render(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let replaced = after.find('}').and_then(|close| {
            let name = &after[..close];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (close, *value))
        });

        match replaced {
            Some((close, value)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}
