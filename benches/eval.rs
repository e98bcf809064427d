use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ndarray::{Array2, Array3};
use spatdens::prelude::ArgFrame;
use spatdens::{
    fetch_args, CovariateTable, InterpretedSpec, MeasureSpec, Model, Observations, Parameters,
    States,
};

const NREPS: usize = 200;
const NTIMES: usize = 50;

fn inputs() -> (Observations, States, Parameters, Vec<f64>) {
    let y = Observations::new(
        vec!["cases".to_string()],
        Array2::from_shape_fn((1, NTIMES), |(_, k)| (k as f64).sin().abs() * 100.0),
    )
    .unwrap();
    let x = States::new(
        vec!["s".to_string(), "i".to_string()],
        Array3::from_shape_fn((2, NREPS, NTIMES), |(v, j, k)| {
            (v + 1) as f64 * 0.01 * (j as f64 + k as f64)
        }),
    )
    .unwrap();
    let p = Parameters::new(
        vec!["rho".to_string()],
        Array2::from_shape_fn((1, NREPS), |(_, j)| 0.5 + j as f64 * 1e-3),
    )
    .unwrap();
    let times: Vec<f64> = (0..NTIMES).map(|k| k as f64).collect();
    (y, x, p, times)
}

fn gaussian_model() -> Model {
    let mut covariates = CovariateTable::new();
    covariates.add_observation("pop", 0.0, 1000.0).unwrap();
    covariates
        .add_observation("pop", NTIMES as f64, 1200.0)
        .unwrap();
    covariates.build();

    let spec = MeasureSpec::Interpreted(InterpretedSpec::new(Box::new(|frame: &ArgFrame| {
        fetch_args!(frame, cases, i, rho, pop);
        let mean = rho * i * pop;
        let sd = 10.0;
        let z = (cases - mean) / sd;
        let log_dens = -0.5 * z * z - sd.ln() - 0.5 * (2.0 * std::f64::consts::PI).ln();
        vec![if frame.log() { log_dens } else { log_dens.exp() }]
    })));
    Model::new(spec, covariates)
}

fn bench_interpreted(c: &mut Criterion) {
    let (y, x, p, times) = inputs();
    let model = gaussian_model();

    c.bench_function("interpreted_gaussian_density", |b| {
        b.iter(|| {
            let result = model
                .evaluate_unit_density(
                    black_box(&y),
                    black_box(&x),
                    black_box(&times),
                    &[0],
                    black_box(&p),
                    true,
                )
                .unwrap();
            black_box(result)
        })
    });
}

criterion_group!(benches, bench_interpreted);
criterion_main!(benches);
