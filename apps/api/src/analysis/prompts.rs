// Résumé extraction prompt. `{cv_text}` is replaced with the cleaned document text.

pub const CV_EXTRACTION_PROMPT: &str = r#"Tu es un expert en analyse de CV. Analyse ce texte et extrais les informations suivantes au format JSON strict et valide :

{
  "nom": "nom de famille trouvé ou 'Non trouvé'",
  "prenom": "prénom trouvé ou 'Non trouvé'",
  "email": "adresse email trouvée ou 'Non trouvé'",
  "telephone": "numéro de téléphone trouvé ou 'Non trouvé'",
  "competences": ["compétence1", "compétence2"],
  "experiences": [
    {"entreprise": "nom entreprise", "poste": "titre poste", "duree": "période"}
  ],
  "formations": [
    {"ecole": "nom école", "diplome": "nom diplôme", "annee": "année"}
  ]
}

Règles :
1. Si une information n'est pas trouvée, mets "Non trouvé" (jamais null).
2. Pour competences, experiences et formations, retourne [] si rien n'est trouvé.
3. Chaque expérience et chaque formation est un objet avec exactement les clés demandées, jamais une chaîne.
4. Retourne UNIQUEMENT l'objet JSON, sans texte autour et sans ```json```.
5. Le JSON doit être syntaxiquement valide.

Texte du CV à analyser :
{cv_text}"#;

pub fn build_cv_prompt(cv_text: &str) -> String {
    CV_EXTRACTION_PROMPT.replace("{cv_text}", cv_text)
}
