//! Offline answers: keyword routing plus a canned synthesis

use chrono::{DateTime, Utc};

const CAMPAIGN_WORDS: &[&str] = &["campagne", "campaign", "engager", "engage"];
const CONTENT_WORDS: &[&str] = &["email", "relance", "reminder", "script", "contenu", "content"];
const MODEL_WORDS: &[&str] = &[
    "modèle", "model", "schéma", "schema", "workflow", "données", "data",
];

/// Agents that would handle `message`, in call order
pub fn route(message: &str) -> Vec<&'static str> {
    let lower = message.to_lowercase();
    let has = |words: &[&str]| words.iter().any(|w| lower.contains(w));

    if has(CAMPAIGN_WORDS) {
        vec!["knowledge_miner", "campaign_manager", "content_generator"]
    } else if has(CONTENT_WORDS) {
        vec!["content_generator"]
    } else if has(MODEL_WORDS) {
        vec!["data_modeler"]
    } else {
        vec!["knowledge_miner"]
    }
}

/// Markdown answer naming the agents and one section per agent
pub fn synthesize(message: &str, agents: &[&str], at: DateTime<Utc>) -> String {
    let mut parts = vec![
        "## Réponse SECT (mode démonstration)".to_string(),
        format!("*Généré le {}*\n", at.format("%Y-%m-%d %H:%M")),
        format!("**Votre demande :** {}\n", message.trim()),
        format!("**Agents mobilisés :** {}\n", agents.join(", ")),
        "---\n".to_string(),
    ];

    for agent in agents {
        match *agent {
            "knowledge_miner" => {
                parts.push("### Recherche & connaissances\n".to_string());
                parts.push(
                    "IMDS 15.0 permet aux fournisseurs de déclarer l'empreinte carbone de leurs \
                     produits directement dans IMDS.\n"
                        .to_string(),
                );
                parts.push("**Points clés :**".to_string());
                for point in [
                    "IMDS 15.0 permet désormais la déclaration PCF directe",
                    "Alignement avec Catena-X PCF Rulebook requis",
                    "Les fournisseurs ont besoin d'accompagnement",
                    "La qualité des données est critique pour le Scope 3",
                ] {
                    parts.push(format!("- {}", point));
                }
                parts.push(String::new());
            }
            "campaign_manager" => {
                parts.push("### Conception de campagne\n".to_string());
                parts.push("**Campagne proposée :** Collecte PCF Tier-1\n".to_string());
                parts.push("**Objectifs :**".to_string());
                parts.push("- Obtenir un PCF validé pour les familles de pièces prioritaires".to_string());
                parts.push("- Atteindre 80 % de taux de réponse en 12 semaines\n".to_string());
            }
            "content_generator" => {
                parts.push("### Contenu généré\n".to_string());
                parts.push("**Type :** email de relance".to_string());
                parts.push(
                    "**Objet :** Votre déclaration PCF est attendue sur le portail fournisseur\n"
                        .to_string(),
                );
            }
            "data_modeler" => {
                parts.push("### Modélisation proposée\n".to_string());
                parts.push("- `Supplier` : fournisseur et profils IMDS/PCF".to_string());
                parts.push("- `Campaign` : campagne et statut par fournisseur".to_string());
                parts.push("- `PcfDeclaration` : déclaration carbone par produit\n".to_string());
            }
            _ => {}
        }
    }

    parts.push("---".to_string());
    parts.push("\n*Mode démonstration actif : réponses simulées sans appel au modèle.*".to_string());
    parts.join("\n")
}
