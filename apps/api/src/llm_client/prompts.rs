// Shared prompt fragments. Each service that calls the LLM keeps its own
// prompts.rs alongside it; only cross-cutting pieces live here.

/// System message for every extraction call: JSON object out, nothing else.
pub const STRICT_JSON_SYSTEM: &str = "Tu es un extracteur de données rigoureux. \
    Tu réponds UNIQUEMENT par un objet JSON valide. \
    Aucun texte avant ou après l'objet, aucun bloc ```json```, \
    aucune explication ni excuse.";
