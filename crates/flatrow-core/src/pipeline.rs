//! Streaming passes over a whole row sequence.
//!
//! Every pass runs as two stages joined at completion. Stage A owns the row
//! source or sink and runs on tokio's blocking pool, since row I/O is
//! synchronous. Stage B runs in the caller's task and moves values through a
//! [`handoff`] queue. Rows are processed strictly in input order.
//!
//! Each entry point takes a [`CancellationToken`]. Cancellation is raced
//! against every handoff send and receive, and Stage A checks it before and
//! after every row read. Stage B races its join on Stage A against the token,
//! so a pass stalled in a read still returns [`Error::Cancelled`] at once; the
//! blocking stage is left to finish that read and exit on its own. Dropping a
//! pass future cancels its Stage A the same way.

use crate::error::{BoxError, Error};
use crate::mapper::Mapper;
use crate::options::Options;
use crate::row::{RowSink, RowSource};
use crate::schema::Record;
use std::io;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// Capacity of the handoff queue.
///
/// tokio has no zero-capacity channel; one slot is the closest to a
/// rendezvous and still applies backpressure after a single value.
pub const HANDOFF_CAPACITY: usize = 1;

/// Create a handoff queue for values of type `T`.
pub fn handoff<T>() -> (mpsc::Sender<T>, mpsc::Receiver<T>) {
    mpsc::channel(HANDOFF_CAPACITY)
}

/// Decode every data row of `source` and send the values to `tx`.
///
/// `tx` is dropped when Stage A ends, successfully or not, which closes the
/// queue for the consumer. A pass cancelled during a blocked read returns
/// before that read does; `tx` is dropped once it returns. A consumer that drops its receiver early ends the
/// pass with [`Error::Disconnected`].
pub async fn unmarshal_to_channel<T, S>(
    cancel: &CancellationToken,
    source: S,
    options: Options,
    tx: mpsc::Sender<T>,
) -> Result<(), Error>
where
    T: Record,
    S: RowSource + Send + 'static,
{
    let stage = cancel.child_token();
    let _stop = stage.clone().drop_guard();

    let decoder = spawn_decoder(stage.clone(), source, options, tx);
    let rows = finish(&stage, decoder).await?;
    debug!(rows, "unmarshal to channel complete");
    Ok(())
}

/// Decode every data row of `source` into a `Vec`.
pub async fn unmarshal_to_vec<T, S>(
    cancel: &CancellationToken,
    source: S,
    options: Options,
) -> Result<Vec<T>, Error>
where
    T: Record,
    S: RowSource + Send + 'static,
{
    let mut values = Vec::new();
    unmarshal_with_callback(cancel, source, options, |value| {
        values.push(value);
        Ok(())
    })
    .await?;
    Ok(values)
}

/// Decode every data row of `source`, calling `f` once per value in order.
///
/// An error from `f` stops the pass and is returned as [`Error::Callback`].
pub async fn unmarshal_with_callback<T, S, F>(
    cancel: &CancellationToken,
    source: S,
    options: Options,
    mut f: F,
) -> Result<(), Error>
where
    T: Record,
    S: RowSource + Send + 'static,
    F: FnMut(T) -> Result<(), BoxError>,
{
    let stage = cancel.child_token();
    let _stop = stage.clone().drop_guard();
    let (tx, mut rx) = handoff::<T>();

    let decoder = spawn_decoder(stage.clone(), source, options, tx);

    let mut row = 0;
    let consumed = loop {
        match recv(cancel, &mut rx).await {
            Ok(Some(value)) => {
                if let Err(source) = f(value) {
                    break Err(Error::Callback { row, source });
                }
                row += 1;
            }
            Ok(None) => break Ok(()),
            Err(err) => break Err(err),
        }
    };

    if consumed.is_err() {
        stage.cancel();
    }
    drop(rx);

    let decoded = finish(&stage, decoder).await;
    consumed?;
    let rows = decoded?;
    debug!(rows, "unmarshal complete");
    Ok(())
}

/// Encode every value received on `rx` into `sink`.
///
/// The header row is always written, even when no value arrives. The sink is
/// flushed and handed back once `rx` is closed and drained.
pub async fn marshal_channel<T, K>(
    cancel: &CancellationToken,
    rx: mpsc::Receiver<T>,
    sink: K,
    options: Options,
) -> Result<K, Error>
where
    T: Record,
    K: RowSink + Send + 'static,
{
    let stage = cancel.child_token();
    let _stop = stage.clone().drop_guard();

    let encoder = spawn_encoder(stage.clone(), rx, sink, options);
    finish(&stage, encoder).await
}

/// Encode every value of `values` into `sink`.
///
/// The values are fed to the encoder through a handoff queue from the
/// caller's task.
pub async fn marshal_iter<T, I, K>(
    cancel: &CancellationToken,
    values: I,
    sink: K,
    options: Options,
) -> Result<K, Error>
where
    T: Record,
    I: IntoIterator<Item = T>,
    K: RowSink + Send + 'static,
{
    let stage = cancel.child_token();
    let _stop = stage.clone().drop_guard();
    let (tx, rx) = handoff::<T>();

    let encoder = spawn_encoder(stage.clone(), rx, sink, options);
    let fed = feed(cancel, values, tx).await;

    // A failed encoder closes the queue, so its error explains the feeder's.
    let encoded = match fed {
        Err(Error::Disconnected { .. }) => join(encoder.await),
        _ => finish(&stage, encoder).await,
    };
    let sink = encoded?;
    fed?;
    Ok(sink)
}

async fn feed<T, I>(cancel: &CancellationToken, values: I, tx: mpsc::Sender<T>) -> Result<(), Error>
where
    I: IntoIterator<Item = T>,
{
    for (row, value) in values.into_iter().enumerate() {
        send(cancel, &tx, value, row).await?;
    }
    Ok(())
}

fn spawn_decoder<T, S>(
    cancel: CancellationToken,
    source: S,
    options: Options,
    tx: mpsc::Sender<T>,
) -> JoinHandle<Result<usize, Error>>
where
    T: Record,
    S: RowSource + Send + 'static,
{
    let handle = Handle::current();
    tokio::task::spawn_blocking(move || decode_rows(&handle, &cancel, source, options, tx))
}

fn spawn_encoder<T, K>(
    cancel: CancellationToken,
    rx: mpsc::Receiver<T>,
    sink: K,
    options: Options,
) -> JoinHandle<Result<K, Error>>
where
    T: Record,
    K: RowSink + Send + 'static,
{
    let handle = Handle::current();
    tokio::task::spawn_blocking(move || encode_rows(&handle, &cancel, rx, sink, options))
}

/// Stage A of a decode pass. Returns the number of rows sent.
fn decode_rows<T, S>(
    handle: &Handle,
    cancel: &CancellationToken,
    mut source: S,
    options: Options,
    tx: mpsc::Sender<T>,
) -> Result<usize, Error>
where
    T: Record,
    S: RowSource,
{
    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }

    let headers = source.read_row().map_err(Error::ReadHeader)?.ok_or_else(|| {
        Error::ReadHeader(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "missing header row",
        ))
    })?;
    let mapper = Mapper::<T>::for_decode(&headers, options)?;

    let mut row = 0;
    loop {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let read = source.read_row();
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        let Some(cells) = read.map_err(|source| Error::Read { row, source })? else {
            break;
        };

        let value = mapper
            .unmarshal(&cells)
            .map_err(|source| Error::Decode { row, source })?;
        trace!(row, "decoded row");

        handle.block_on(send(cancel, &tx, value, row))?;
        row += 1;
    }

    Ok(row)
}

/// Stage A of an encode pass.
fn encode_rows<T, K>(
    handle: &Handle,
    cancel: &CancellationToken,
    mut rx: mpsc::Receiver<T>,
    mut sink: K,
    options: Options,
) -> Result<K, Error>
where
    T: Record,
    K: RowSink,
{
    let mapper = Mapper::<T>::for_encode(options)?;
    sink.write_row(&mapper.headers())
        .map_err(Error::WriteHeader)?;

    let delimiter = sink.delimiter();
    let mut row = 0;
    while let Some(value) = handle.block_on(recv(cancel, &mut rx))? {
        let cells = mapper
            .marshal(&value, delimiter)
            .map_err(|source| Error::Encode { row, source })?;
        sink.write_row(&cells)
            .map_err(|source| Error::Write { row, source })?;
        trace!(row, "encoded row");
        row += 1;
    }

    sink.flush().map_err(Error::Flush)?;
    debug!(rows = row, "marshal complete");
    Ok(sink)
}

async fn send<T>(
    cancel: &CancellationToken,
    tx: &mpsc::Sender<T>,
    value: T,
    row: usize,
) -> Result<(), Error> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(Error::Cancelled),
        sent = tx.send(value) => sent.map_err(|_| Error::Disconnected { row }),
    }
}

async fn recv<T>(
    cancel: &CancellationToken,
    rx: &mut mpsc::Receiver<T>,
) -> Result<Option<T>, Error> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(Error::Cancelled),
        value = rx.recv() => Ok(value),
    }
}

/// Wait for Stage A unless `stage` is cancelled first.
async fn finish<R>(
    stage: &CancellationToken,
    task: JoinHandle<Result<R, Error>>,
) -> Result<R, Error> {
    tokio::select! {
        biased;
        () = stage.cancelled() => Err(Error::Cancelled),
        joined = task => join(joined),
    }
}

/// Unwrap a blocking stage's result, re-raising its panic if it had one.
fn join<R>(joined: Result<Result<R, Error>, JoinError>) -> Result<R, Error> {
    match joined {
        Ok(result) => result,
        Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
        Err(_) => Err(Error::Cancelled),
    }
}
