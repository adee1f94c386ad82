use canine_common::openai::{Message, Role};
use source_router::Grounding;

pub const SYSTEM_PROMPT: &str = "\
You are the All-Breed Canine Assistant for dog owners, handlers, and breeders.

FOCUS
- Health education: rely on approved veterinary bodies (VIN Veterinary Partner, Merck Vet Manual, AVMA, AAHA, FDA CVM, specialty colleges, CAPC, university vet sites). Use only the links in \"Approved links\" for citations.
- Training and socialization: positive reinforcement, stepwise plans, and humane methods; reference credible training bodies (CCPDT, VSA, APDT, Karen Pryor Academy) when useful.
- Getting started in showing and competition (AKC/UKC basics).
- Ethical breeding (pre-breeding health testing, whelping care, responsible placement).

GUARDRAILS
- Not a substitute for a veterinarian. For urgent, severe, or individualized medical issues, advise contacting a licensed veterinarian or emergency clinic.
- Do not invent sources. Only cite from the provided approved links.
- Keep answers clear, kind, and professional.

STYLE
- Start with concise, actionable steps, then brief context.
- End every answer with a short \"Sources\" section listing 2-4 of the approved links most relevant to the question.

HOUSE GUIDANCE
- If a \"House guidance\" block is provided, treat it as first-party guidance. Use it freely, but never name or refer to any book or internal source.";

const HOUSE_GUIDANCE_HEADER: &str = "House guidance (first-party, do not attribute):";

/// Message list for one completion: system prompt, approved links, optional
/// house guidance, then the user's question.
///
/// Note titles and ids never reach the model; only bodies are forwarded.
pub fn build_messages(user_message: &str, grounding: &Grounding<'_>) -> Vec<Message> {
    let mut messages = Vec::with_capacity(4);
    messages.push(Message::new(Role::System, SYSTEM_PROMPT));
    messages.push(Message::new(Role::Assistant, links_context(&grounding.links)));

    let bodies: Vec<&str> = grounding
        .notes
        .iter()
        .map(|note| note.body.as_str())
        .filter(|body| !body.is_empty())
        .collect();
    if !bodies.is_empty() {
        messages.push(Message::new(
            Role::Assistant,
            format!("{HOUSE_GUIDANCE_HEADER}\n\n{}", bodies.join("\n\n---\n\n")),
        ));
    }

    messages.push(Message::new(Role::User, user_message));
    messages
}

fn links_context(links: &[String]) -> String {
    let mut out = String::from("Approved links relevant to this question:");
    for link in links {
        out.push_str("\n- ");
        out.push_str(link);
    }
    out
}

#[cfg(test)]
mod tests {
    use source_router::GuidanceNote;

    use super::*;

    fn note(title: &str, body: &str) -> GuidanceNote {
        GuidanceNote {
            id: format!("{}.md", title.to_lowercase().replace(' ', "-")),
            title: title.to_string(),
            tags: vec![],
            keywords: vec![],
            body: body.to_string(),
        }
    }

    #[test]
    fn messages_without_notes_skip_house_guidance() {
        let grounding = Grounding {
            links: vec!["https://a.example/".to_string(), "https://b.example/".to_string()],
            notes: vec![],
        };
        let messages = build_messages("How often should I bathe my dog?", &grounding);

        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(
            messages[1].content,
            "Approved links relevant to this question:\n- https://a.example/\n- https://b.example/"
        );
        assert_eq!(messages[2].role, Role::User);
        assert_eq!(messages[2].content, "How often should I bathe my dog?");
    }

    #[test]
    fn house_guidance_carries_bodies_but_never_titles() {
        let first = note("Puppy Book Chapter Seven", "Keep crate sessions short.");
        let second = note("Breeder Handbook", "Reward calm behavior.");
        let grounding = Grounding {
            links: vec!["https://a.example/".to_string()],
            notes: vec![&first, &second],
        };
        let messages = build_messages("crate training tips", &grounding);

        assert_eq!(messages.len(), 4);
        let guidance = &messages[2];
        assert_eq!(guidance.role, Role::Assistant);
        assert!(guidance.content.starts_with(HOUSE_GUIDANCE_HEADER));
        assert!(guidance.content.contains("Keep crate sessions short."));
        assert!(guidance.content.contains("Reward calm behavior."));
        for m in &messages {
            assert!(!m.content.contains("Puppy Book Chapter Seven"));
            assert!(!m.content.contains("Breeder Handbook"));
            assert!(!m.content.contains("puppy-book-chapter-seven.md"));
        }
        assert_eq!(messages[3].role, Role::User);
    }

    #[test]
    fn empty_bodies_are_not_forwarded() {
        let blank = note("Blank", "");
        let grounding = Grounding {
            links: vec!["https://a.example/".to_string()],
            notes: vec![&blank],
        };
        assert_eq!(build_messages("hi", &grounding).len(), 3);
    }
}
