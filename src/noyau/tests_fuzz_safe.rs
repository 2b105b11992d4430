//! Tests fuzz safe : robustesse + déterminisme + limites contrôlées.
//!
//! But : marteler le pipeline sans brûler la machine.
//! - RNG déterministe (seed fixe)
//! - profondeur bornée
//! - budget temps global
//! - toute erreur est une valeur (`Resultat::Erreur`), jamais un panic
//! - sur une expression bien formée, seules les erreurs de calcul sont admises

use std::time::{Duration, Instant};

use super::erreur::ErreurCalcul;
use super::eval::{evaluer, Resultat};
use super::session::Session;
use super::symboles::ModeAngle;

/* ------------------------ RNG déterministe minimal ------------------------ */

#[derive(Clone)]
struct Rng {
    state: u64,
}
impl Rng {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }
    fn next_u32(&mut self) -> u32 {
        // LCG simple (déterministe)
        self.state = self.state.wrapping_mul(6364136223846793005).wrapping_add(1);
        (self.state >> 32) as u32
    }
    fn pick(&mut self, n: u32) -> u32 {
        if n == 0 {
            0
        } else {
            self.next_u32() % n
        }
    }
    fn coin(&mut self) -> bool {
        (self.next_u32() & 1) == 1
    }
    fn choisir<'a>(&mut self, options: &[&'a str]) -> &'a str {
        options[self.pick(options.len() as u32) as usize]
    }
}

/* ------------------------ Budget anti-gel ------------------------ */

fn budget(start: Instant, max: Duration) {
    if start.elapsed() > max {
        panic!("budget temps dépassé: {:?}", max);
    }
}

/* ------------------------ Helpers fuzz ------------------------ */

/// Erreurs normales sur une expression bien formée : le calcul, pas la syntaxe.
fn est_erreur_de_calcul(e: &ErreurCalcul) -> bool {
    matches!(
        e,
        ErreurCalcul::DivisionParZero
            | ErreurCalcul::Domaine(_)
            | ErreurCalcul::Indefini(_)
            | ErreurCalcul::Depassement(_)
    )
}

/* ------------------------ Génération d’expressions (bornée) ------------------------ */

fn gen_rat(rng: &mut Rng) -> String {
    // inclut 0 (utile pour tester zéros et divisions)
    let a = rng.pick(8);
    let b = rng.pick(8) + 1;
    match rng.pick(3) {
        0 => format!("{a}/{b}"),
        1 => format!("{a}.{b}"),
        _ => format!("{a}"),
    }
}

fn gen_coeff_pi(rng: &mut Rng) -> String {
    let k = rng.pick(14) as i64 - 6;
    let d = rng.choisir(&["1", "2", "3", "4", "6", "12"]);
    if d == "1" {
        format!("{k}*pi")
    } else {
        format!("{k}*pi/{d}")
    }
}

fn gen_angle_degres(rng: &mut Rng) -> String {
    let k = rng.pick(49) as i64 - 24;
    format!("{}", k * 15)
}

fn gen_atom(rng: &mut Rng) -> String {
    match rng.pick(6) {
        0 | 1 => gen_rat(rng),
        2 => "pi".to_string(),
        3 => format!("({})", gen_coeff_pi(rng)),
        4 => "e".to_string(),
        _ => rng.choisir(&["sqrt(2)", "sqrt(3)", "√5", "50%", "3!"]).to_string(),
    }
}

fn gen_expr(rng: &mut Rng, depth: usize, mode: ModeAngle) -> String {
    if depth == 0 {
        return gen_atom(rng);
    }

    let angle = |rng: &mut Rng| match mode {
        ModeAngle::Radians => gen_coeff_pi(rng),
        ModeAngle::Degres => gen_angle_degres(rng),
    };

    match rng.pick(12) {
        0 => gen_atom(rng),
        1 => format!("({}+{})", gen_expr(rng, depth - 1, mode), gen_expr(rng, depth - 1, mode)),
        2 => format!("({}-{})", gen_expr(rng, depth - 1, mode), gen_expr(rng, depth - 1, mode)),
        3 => format!("({}*{})", gen_expr(rng, depth - 1, mode), gen_expr(rng, depth - 1, mode)),
        4 => format!("({}/{})", gen_expr(rng, depth - 1, mode), gen_expr(rng, depth - 1, mode)),
        5 => format!("({})^{}", gen_expr(rng, depth - 1, mode), rng.pick(4)),
        6 => format!("-{}", gen_atom(rng)),
        7 => format!("sin({})", angle(rng)),
        8 => format!("cos({})", angle(rng)),
        9 => format!("tan({})", angle(rng)),
        10 => {
            let f = rng.choisir(&["ln", "log10", "exp", "abs", "sqrt", "atan", "tanh"]);
            format!("{f}({})", gen_expr(rng, depth - 1, mode))
        }
        _ => {
            if rng.coin() {
                format!("x*{}", gen_atom(rng))
            } else {
                gen_atom(rng)
            }
        }
    }
}

fn gen_bruit(rng: &mut Rng) -> String {
    const ALPHABET: [&str; 24] = [
        "1", "2", "0", ".", "+", "-", "*", "/", "^", "(", ")", "%", "!", "x", "pi", "sin",
        "ans", "√", "π", "×", "÷", " ", "e", "zz",
    ];
    let n = rng.pick(16) as usize;
    (0..n).map(|_| rng.choisir(&ALPHABET)).collect()
}

/* ------------------------ Helper somme balancée anti pile ------------------------ */

fn somme_balancee(terme: &str, n: usize) -> String {
    let mut items: Vec<String> = (0..n).map(|_| terme.to_string()).collect();
    while items.len() > 1 {
        let mut next = Vec::new();
        let mut i = 0;
        while i < items.len() {
            if i + 1 < items.len() {
                next.push(format!("({}+{})", items[i], items[i + 1]));
                i += 2;
            } else {
                next.push(items[i].clone());
                i += 1;
            }
        }
        items = next;
    }
    items.pop().unwrap_or_else(|| "0".to_string())
}

/* ------------------------ Tests ------------------------ */

#[test]
fn fuzz_safe_determinisme_et_erreurs_de_calcul() {
    let t0 = Instant::now();
    let max = Duration::from_secs(5);

    for mode in [ModeAngle::Radians, ModeAngle::Degres] {
        let mut rng = Rng::new(0xC0FFEE_u64);
        let mut seen_ok = 0usize;
        let mut seen_err = 0usize;

        for _ in 0..120 {
            budget(t0, max);

            let expr = gen_expr(&mut rng, 4, mode);
            let (r1, d1) = evaluer(&expr, mode, 30);
            let (r2, d2) = evaluer(&expr, mode, 30);

            // même texte, même mode => même résultat, même démarche
            assert_eq!(r1, r2, "non déterministe: {expr:?}");
            assert_eq!(d1.rpn, d2.rpn);
            assert_eq!(d1.preuve, d2.preuve);

            match &r1 {
                Resultat::Erreur(e) => {
                    assert!(est_erreur_de_calcul(e), "erreur non attendue: expr={expr:?} err={e}");
                    seen_err += 1;
                }
                _ => seen_ok += 1,
            }
        }

        // On veut voir un mix des deux, sinon le fuzz ne “balaye” rien.
        assert!(seen_ok > 10, "trop peu de succès: {seen_ok}");
        assert!(seen_err > 0, "aucune erreur vue: fuzz trop “sage”");
    }
}

#[test]
fn fuzz_safe_bruit_sans_panic() {
    let t0 = Instant::now();
    let max = Duration::from_secs(5);

    let mut rng = Rng::new(0xBADC0DE_u64);
    for _ in 0..400 {
        budget(t0, max);
        let texte = gen_bruit(&mut rng);
        // seule exigence : une valeur, pas un panic, et le même texte deux fois
        let a = evaluer(&texte, ModeAngle::Radians, 15).0;
        let b = evaluer(&texte, ModeAngle::Radians, 15).0;
        assert_eq!(a, b, "{texte:?}");
    }
}

#[test]
fn fuzz_safe_angles_speciaux_exacts() {
    let t0 = Instant::now();
    let max = Duration::from_secs(5);

    let mut rng = Rng::new(0x5EED_u64);
    for _ in 0..80 {
        budget(t0, max);

        let k = rng.pick(49) as i64 - 24;
        let deg = k * 15;
        // angle en degrés vs le même en radians
        let a = evaluer(&format!("cos({deg})"), ModeAngle::Degres, 25).0;
        let b = evaluer(&format!("cos({k}*pi/12)"), ModeAngle::Radians, 25).0;
        assert_eq!(a.texte(), b.texte(), "cos({deg}°)");
    }
}

#[test]
fn fuzz_safe_session_ans_et_historique() {
    let t0 = Instant::now();
    let max = Duration::from_secs(5);

    let mut rng = Rng::new(0xA115_u64);
    let mut s = Session::new(20, 10);
    let mut succes = 0usize;

    for _ in 0..60 {
        budget(t0, max);

        let expr = match rng.pick(3) {
            0 => format!("ans+{}", gen_rat(&mut rng)),
            1 => format!("ans*{}", gen_atom(&mut rng)),
            _ => gen_expr(&mut rng, 2, ModeAngle::Radians),
        };
        let avant = s.reponse().clone();
        let (r, suite) = s.evaluer(&expr, ModeAngle::Radians);
        s = suite;

        if r.est_erreur() {
            assert_eq!(s.reponse(), &avant, "{expr:?}");
        } else {
            succes += 1;
            let e = s.historique().plus_recente().unwrap();
            assert_eq!(e.expression, expr);
            assert_eq!(e.resultat, r.texte());
        }
        assert_eq!(s.historique().len(), succes.min(10));
    }
}

#[test]
fn fuzz_safe_somme_balancee_anti_pile() {
    let t0 = Instant::now();
    let max = Duration::from_secs(5);

    let expr = somme_balancee("1/2", 800);
    let r = evaluer(&expr, ModeAngle::Radians, 10).0;
    budget(t0, max);

    // 800*(1/2) = 400
    assert_eq!(r.texte(), "400");
}
