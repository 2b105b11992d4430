// src/noyau/historique.rs
//
// Journal des calculs réussis : plus récent en tête, capacité bornée.
// Export CSV (en-tête `expression,resultat`, même ordre que l’affichage).

use log::info;
use std::collections::VecDeque;
use std::path::Path;
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entree {
    pub expression: String,
    pub resultat: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Historique {
    entrees: VecDeque<Entree>,
    capacite: usize,
}

#[derive(Debug, Error)]
pub enum ErreurExport {
    #[error("CSV : {0}")]
    Csv(#[from] csv::Error),

    #[error("écriture : {0}")]
    Io(#[from] std::io::Error),

    #[error("encodage : {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl Historique {
    pub fn new(capacite: usize) -> Self {
        let capacite = capacite.max(1);
        Historique {
            entrees: VecDeque::with_capacity(capacite),
            capacite,
        }
    }

    pub fn capacite(&self) -> usize {
        self.capacite
    }

    pub fn len(&self) -> usize {
        self.entrees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entrees.is_empty()
    }

    /// Plus récent d’abord.
    pub fn iter(&self) -> impl Iterator<Item = &Entree> {
        self.entrees.iter()
    }

    pub fn plus_recente(&self) -> Option<&Entree> {
        self.entrees.front()
    }

    /// Ajoute en tête ; la plus ancienne sort si la capacité est dépassée.
    pub fn ajouter(&mut self, expression: impl Into<String>, resultat: impl Into<String>) {
        self.entrees.push_front(Entree {
            expression: expression.into(),
            resultat: resultat.into(),
        });
        self.entrees.truncate(self.capacite);
    }

    pub fn vider(&mut self) {
        self.entrees.clear();
    }

    pub fn vers_csv(&self) -> Result<String, ErreurExport> {
        let mut w = csv::Writer::from_writer(Vec::new());
        w.write_record(["expression", "resultat"])?;
        for e in &self.entrees {
            w.write_record([e.expression.as_str(), e.resultat.as_str()])?;
        }
        let octets = w.into_inner().map_err(|e| e.into_error())?;
        Ok(String::from_utf8(octets)?)
    }

    pub fn enregistrer(&self, chemin: &Path) -> Result<(), ErreurExport> {
        std::fs::write(chemin, self.vers_csv()?)?;
        info!(
            "historique exporté : {} entrées -> {}",
            self.len(),
            chemin.display()
        );
        Ok(())
    }
}
